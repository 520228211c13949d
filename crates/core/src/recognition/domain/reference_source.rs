use crate::recognition::domain::identity::Identity;

/// External source of truth for the reference identity set.
///
/// Where the identities live (file, database, service) is outside the
/// core; the store only asks for a complete, self-consistent list.
pub trait ReferenceSource: Send {
    fn load(&mut self) -> Result<Vec<Identity>, Box<dyn std::error::Error>>;
}
