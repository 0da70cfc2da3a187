use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $s)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "Patient",
    Doctor => "Doctor",
});

str_enum!(AppointmentStatus {
    Pending => "Pending",
    Confirmed => "Confirmed",
    InProgress => "In Progress",
    Completed => "Completed",
});

impl AppointmentStatus {
    /// The single legal `advance` target from this status, if any.
    ///
    /// `Pending` has no advance target — its only exit is the accept
    /// operation. `Completed` is terminal.
    pub fn advance_target(&self) -> Option<AppointmentStatus> {
        match self {
            Self::Pending => None,
            Self::Confirmed => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => None,
        }
    }
}
