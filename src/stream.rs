use crate::error::Result;

/// Forwards each non-empty fragment to `sink` as it arrives and returns the
/// concatenated reply once the stream ends. The first error ends the drain.
pub fn drain<I>(fragments: I, mut sink: impl FnMut(&str)) -> Result<String>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut reply = String::new();
    for fragment in fragments {
        let fragment = fragment?;
        if fragment.is_empty() {
            continue;
        }
        sink(&fragment);
        reply.push_str(&fragment);
    }
    Ok(reply)
}
