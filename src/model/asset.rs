/// Pairing of an origin asset URL with its canonical local path
///
/// `local_path` is a URL path under the static root (`/static/...`) and maps 1:1 to a
/// file under the public directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetReference {
    /// Absolute URL on the origin, query and fragment removed
    pub remote_url: String,
    /// Canonical local path the asset is served under
    pub local_path: String,
}
