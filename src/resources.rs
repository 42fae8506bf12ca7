//! Decide which files a fan-out partition needs copied locally.

use crate::reconstitute::ParallelDescriptor;
use crate::tree::Context;

/// True when the leaf at `context` must be physically staged for `parallel`.
///
/// With no declared resources everything is required. Otherwise the context
/// must begin with one of the declared prefixes, compared key by key. This
/// only gates copying; paths are rewritten either way.
pub fn is_required_resource(context: &Context, parallel: &ParallelDescriptor) -> bool {
    match parallel.fresources.as_deref() {
        None | Some([]) => true,
        Some(prefixes) => prefixes
            .iter()
            .any(|prefix| context.starts_with(prefix.as_slice())),
    }
}
