error_chain! {
    foreign_links {
        VarError(::std::env::VarError);
        ParseIntError(::std::num::ParseIntError);
        StdIoError(::std::io::Error);
        DieselError(::diesel::result::Error);
        DieselConnectionError(::diesel::result::ConnectionError);
        PoolError(::diesel::r2d2::PoolError);
        DieselMigrationError(::diesel::migration::RunMigrationsError);
        CsvError(::csv::Error);
    }
    errors {
        InvalidInput(field: String, message: String) {
            description("Provided input is invalid.")
            display("{}: {}", field, message)
        }
        InactiveLesson {
            description("The lesson is inactive.")
            display("The lesson is inactive.")
        }
        OwnershipViolation(field: &'static str, id: i32) {
            description("Referenced object does not exist.")
            display("Invalid pk \"{}\" - object does not exist.", id)
        }
        NotFound(what: &'static str) {
            description("Not found.")
            display("Not found.")
        }
        UniqueConstraintViolation {
            description("This translation already exists.")
            display("This translation already exists.")
        }
        NoSuchUser(username: String) {
            description("No such user exists")
            display("No user with username {} exists.", username)
        }
        DatabaseOdd(reason: &'static str) {
            description("There's something wrong with the contents of the DB vs. how it should be!")
            display("There's something wrong with the contents of the DB vs. how it should be! {}", reason)
        }
    }
}

pub fn invalid<T>(field: &str, message: impl Into<String>) -> Result<T> {
    Err(ErrorKind::InvalidInput(field.into(), message.into()).into())
}

impl Error {
    /// Rejected input, as opposed to a server-side failure.
    pub fn is_validation(&self) -> bool {
        match *self.kind() {
            ErrorKind::InvalidInput(..)
            | ErrorKind::InactiveLesson
            | ErrorKind::OwnershipViolation(..)
            | ErrorKind::UniqueConstraintViolation => true,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match *self.kind() {
            ErrorKind::NotFound(_) | ErrorKind::NoSuchUser(_) => true,
            _ => false,
        }
    }

    /// The field the failure is attached to, if any.
    pub fn field(&self) -> Option<&str> {
        match *self.kind() {
            ErrorKind::InvalidInput(ref field, _) => Some(field),
            ErrorKind::InactiveLesson => Some("lesson"),
            ErrorKind::OwnershipViolation(field, _) => Some(field),
            _ => None,
        }
    }

    /// The message to show next to `field()`.
    pub fn field_message(&self) -> String {
        match *self.kind() {
            ErrorKind::InvalidInput(_, ref message) => message.clone(),
            ref kind => kind.to_string(),
        }
    }
}

/// Maps diesel's `NotFound` into ours, keeping the storage error otherwise.
pub fn not_found(what: &'static str) -> impl Fn(::diesel::result::Error) -> Error {
    move |e| match e {
        ::diesel::result::Error::NotFound => ErrorKind::NotFound(what).into(),
        e => e.into(),
    }
}

pub fn is_unique_violation(e: &::diesel::result::Error) -> bool {
    use diesel::result::{DatabaseErrorKind, Error::DatabaseError};
    match *e {
        DatabaseError(DatabaseErrorKind::UniqueViolation, _) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_violation_reads_as_missing_object() {
        let err: Error = ErrorKind::OwnershipViolation("translations", 42).into();
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("translations"));
        assert_eq!(err.field_message(), "Invalid pk \"42\" - object does not exist.");
    }

    #[test]
    fn diesel_not_found_is_converted() {
        let err = not_found("lesson")(::diesel::result::Error::NotFound);
        assert!(err.is_not_found());
        assert!(!err.is_validation());

        let err = not_found("lesson")(::diesel::result::Error::RollbackTransaction);
        assert!(!err.is_not_found());
    }

    #[test]
    fn invalid_input_carries_field_and_message() {
        let err = invalid::<()>("lang", "\"xx\" is not a valid choice.").unwrap_err();
        assert_eq!(err.field(), Some("lang"));
        assert_eq!(err.field_message(), "\"xx\" is not a valid choice.");
        assert_eq!(err.to_string(), "lang: \"xx\" is not a valid choice.");
    }
}
