//! Stage flag and list-filter enums for the `assessments` table.
//!
//! Flags are stored as SMALLINT. The discriminants below are the exact
//! persisted values.

use blusanta_core::error::CoreError;

/// Flag value type matching SMALLINT in the database.
pub type FlagValue = i16;

macro_rules! define_flag_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the persisted flag value.
            pub fn id(self) -> FlagValue {
                self as FlagValue
            }

            /// Map a persisted value back to its variant.
            pub fn from_value(value: FlagValue) -> Option<Self> {
                match value {
                    $( v if v == $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for FlagValue {
            fn from(value: $name) -> Self {
                value as FlagValue
            }
        }
    };
}

define_flag_enum! {
    /// Progress of one pipeline stage (audio generation or video stitching).
    StageFlag {
        Failed = -1,
        Pending = 0,
        Done = 1,
    }
}

/// `?status=` filter on the assessment listing, keyed on `video_stitch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentStatus {
    Pending,
    Completed,
    Failed,
}

impl AssessmentStatus {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Must be one of: pending, completed, failed"
            ))),
        }
    }

    /// The `video_stitch` value this filter selects.
    pub fn stitch_flag(self) -> StageFlag {
        match self {
            Self::Pending => StageFlag::Pending,
            Self::Completed => StageFlag::Done,
            Self::Failed => StageFlag::Failed,
        }
    }
}
