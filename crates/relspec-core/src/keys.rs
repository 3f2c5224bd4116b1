//! # Schema Keys
//!
//! OpenAPI keywords and the relational `x-*` extension keys understood by
//! the engine. Every lookup goes through these constants.

/// Reference to another named schema.
pub const REF: &str = "$ref";
/// Ordered composition of schema fragments.
pub const ALL_OF: &str = "allOf";
pub const TYPE: &str = "type";
pub const FORMAT: &str = "format";
pub const MAX_LENGTH: &str = "maxLength";
pub const NULLABLE: &str = "nullable";
pub const DEFAULT: &str = "default";
pub const DESCRIPTION: &str = "description";
pub const READ_ONLY: &str = "readOnly";
pub const WRITE_ONLY: &str = "writeOnly";
pub const PROPERTIES: &str = "properties";
pub const REQUIRED: &str = "required";
pub const ITEMS: &str = "items";

/// Table name; marks a schema as constructable.
pub const TABLENAME: &str = "x-tablename";
/// Inheritance marker: `true` or the parent schema name.
pub const INHERITS: &str = "x-inherits";
/// Reverse relationship property name on the target.
pub const BACKREF: &str = "x-backref";
/// Association table name of a many-to-many relationship.
pub const SECONDARY: &str = "x-secondary";
/// `false` turns a many-to-one into a one-to-one.
pub const USELIST: &str = "x-uselist";
/// Overrides the column a foreign key targets.
pub const FOREIGN_KEY_COLUMN: &str = "x-foreign-key-column";
/// `table.column` target of a foreign-key column.
pub const FOREIGN_KEY: &str = "x-foreign-key";
pub const FOREIGN_KEY_KWARGS: &str = "x-foreign-key-kwargs";
pub const PRIMARY_KEY: &str = "x-primary-key";
pub const AUTOINCREMENT: &str = "x-autoincrement";
pub const INDEX: &str = "x-index";
pub const UNIQUE: &str = "x-unique";
pub const KWARGS: &str = "x-kwargs";
pub const COMPOSITE_INDEX: &str = "x-composite-index";
pub const COMPOSITE_UNIQUE: &str = "x-composite-unique";
/// Stores the property as a JSON column instead of interpreting its shape.
pub const JSON: &str = "x-json";
/// Excludes a column from the model's dictionary interface.
pub const DICT_IGNORE: &str = "x-dict-ignore";

/// Property-only extension keys that must never appear at a model root.
pub const MODEL_FORBIDDEN_KEYS: [&str; 6] = [
    PRIMARY_KEY,
    AUTOINCREMENT,
    INDEX,
    UNIQUE,
    FOREIGN_KEY,
    FOREIGN_KEY_KWARGS,
];

/// The only keys accepted inside `x-foreign-key-kwargs`.
pub const FOREIGN_KEY_KWARGS_KEYS: [&str; 7] = [
    "ondelete",
    "onupdate",
    "deferrable",
    "initially",
    "match",
    "name",
    "use_alter",
];

/// Column arguments that a property's `x-kwargs` may not set because the
/// schema already controls them.
pub const COLUMN_RESERVED_KWARGS: [&str; 7] = [
    "nullable",
    "default",
    "primary_key",
    "autoincrement",
    "index",
    "unique",
    "type_",
];

/// Model `x-kwargs` key that is always derived from the schema.
pub const TABLE_ARGS: &str = "__table_args__";
