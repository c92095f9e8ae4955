//! Lifecycle stage values carried on patient and ticket records.
//!
//! Records arrive with free-text stage labels. Known labels map to named variants; anything else
//! is preserved verbatim in `Other` so an unfamiliar label never fails a load and round-trips
//! unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! stage_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A label this crate does not recognise.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Other(label) => label,
                }
            }
        }

        impl From<String> for $name {
            fn from(label: String) -> Self {
                match label.trim() {
                    $($label => Self::$variant,)+
                    _ => Self::Other(label),
                }
            }
        }

        impl From<&str> for $name {
            fn from(label: &str) -> Self {
                Self::from(label.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(stage: $name) -> Self {
                stage.as_str().to_owned()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

stage_enum! {
    /// Coarse position of a patient in the care funnel.
    CareStage {
        Kit => "Kit",
        RampOn => "Ramp On",
        Program => "Program",
        Maintenance => "Maintenance",
        RampOff => "Ramp Off",
    }
}

stage_enum! {
    /// Status of a workflow: a program or maintenance period, or a risk/deferral ticket.
    WorkflowStage {
        NotStarted => "Not Started",
        Pending => "Pending",
        Active => "Active",
        Completed => "Completed",
        Resolved => "Resolved",
        Cancelled => "Cancelled",
    }
}

stage_enum! {
    /// Shipping status of a patient's device kit.
    KitStage {
        Pending => "Pending",
        InTransit => "In Transit",
        Delivered => "Delivered",
        Delayed => "Delayed",
        Lost => "Lost",
        Returned => "Returned",
    }
}

impl CareStage {
    /// Funnel order, used for stage distributions.
    pub const ALL: [CareStage; 5] = [
        CareStage::Kit,
        CareStage::RampOn,
        CareStage::Program,
        CareStage::Maintenance,
        CareStage::RampOff,
    ];

    /// Stages in which a patient counts as actively enrolled.
    pub fn is_enrolled(&self) -> bool {
        matches!(
            self,
            CareStage::RampOn | CareStage::Program | CareStage::Maintenance
        )
    }
}

impl WorkflowStage {
    pub fn is_active(&self) -> bool {
        matches!(self, WorkflowStage::Active)
    }
}

impl KitStage {
    /// Delayed or lost in shipping.
    pub fn has_delivery_issue(&self) -> bool {
        matches!(self, KitStage::Delayed | KitStage::Lost)
    }
}

/// `true` when an optional stage is present and active.
pub fn is_active(stage: Option<&WorkflowStage>) -> bool {
    stage.is_some_and(WorkflowStage::is_active)
}
