//! Confirmation for destructive actions

/// Yes/no gate asked before a saved timer is deleted
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// An answer given up front, e.g. the `confirm` query flag on an HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(pub bool);

impl Confirm for Confirmation {
    fn confirm(&self, prompt: &str) -> bool {
        if !self.0 {
            tracing::debug!("Confirmation not given for: {}", prompt);
        }
        self.0
    }
}
