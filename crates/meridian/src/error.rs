/// Only `parse` (by extension, `convert`) can fail (§7); `autoLayout` and `toRenderer` are
/// infallible given a valid `Graph`.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error(transparent)]
    Parse(#[from] meridian_core::ParseError),
}
