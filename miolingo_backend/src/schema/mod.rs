mod specified_schema;
pub use self::specified_schema::*;
