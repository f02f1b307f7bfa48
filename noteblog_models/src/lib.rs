pub mod blog_post;
pub mod note;
pub mod prelude;
mod record;

// Export all Model at crate root
pub use blog_post::BlogPost;
pub use note::Note;

use database::DatabaseError;
use diesel::result::DatabaseErrorKind;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("check constraint violation of \"{constraint}\"")]
    CheckViolation { constraint: String },
    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        match &e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::CheckViolation, inner) => {
                match inner.constraint_name() {
                    Some(constraint) => Self::CheckViolation {
                        constraint: constraint.to_owned(),
                    },
                    None => {
                        // still semantically correct, logging the error is enough
                        tracing::error!(
                            error = %e,
                            "PostgreSQL did not report the violated constraint"
                        );
                        Self::DatabaseError(e.into())
                    }
                }
            }
            _ => Self::DatabaseError(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use diesel::result::DatabaseErrorInformation;
    use pretty_assertions::assert_eq;

    use super::*;

    struct Violation {
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "new row for relation \"note\" violates check constraint \"note_content_not_blank\""
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("note")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn check_violation(constraint: Option<&'static str>) -> diesel::result::Error {
        diesel::result::Error::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new(Violation { constraint }),
        )
    }

    #[test]
    fn check_violations_name_their_constraint() {
        assert_eq!(
            Error::from(check_violation(Some("note_content_not_blank"))),
            Error::CheckViolation {
                constraint: "note_content_not_blank".to_owned()
            }
        );
    }

    #[test]
    fn unnamed_check_violations_fall_back_to_database_errors() {
        assert!(matches!(
            Error::from(check_violation(None)),
            Error::DatabaseError(_)
        ));
    }

    #[test]
    fn other_errors_are_database_errors() {
        assert_eq!(
            Error::from(diesel::result::Error::NotFound),
            Error::DatabaseError(DatabaseError(diesel::result::Error::NotFound))
        );
    }
}
