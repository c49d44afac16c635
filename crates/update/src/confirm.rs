//! Confirmation capabilities used by the update transaction
//!
//! Ordinary confirmation and schema override are separate traits so that a
//! yes/no answer can never satisfy the override.

use crate::compat::CompatibilityResult;

/// Exact text a user must type to apply a template of a different schema
pub const OVERRIDE_TOKEN: &str = "OVERRIDE SCHEMA";

/// Yes/no confirmation of an update that needs one
pub trait Confirm {
    fn confirm_update(&self, result: &CompatibilityResult) -> bool;
}

/// High-friction confirmation of a schema override
pub trait SchemaOverrideConfirm {
    /// Return the text the user typed, or `None` if they aborted.
    /// The override proceeds only if it equals [`OVERRIDE_TOKEN`].
    fn request_override(&self, result: &CompatibilityResult) -> Option<String>;
}

/// A fixed yes/no answer
#[derive(Debug, Clone, Copy)]
pub struct Decision(pub bool);

impl Confirm for Decision {
    fn confirm_update(&self, _result: &CompatibilityResult) -> bool {
        self.0
    }
}

/// Override text supplied ahead of time, e.g. from a command-line flag
#[derive(Debug, Clone, Default)]
pub struct TypedToken(pub Option<String>);

impl SchemaOverrideConfirm for TypedToken {
    fn request_override(&self, _result: &CompatibilityResult) -> Option<String> {
        self.0.clone()
    }
}
