use std::io::{self, Read};

/// Raw text piped on stdin. None when stdin is a terminal or carries only
/// whitespace, so the caller can report the missing input itself.
pub fn read_piped() -> io::Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().lock().read_to_string(&mut buffer)?;

    Ok(Some(buffer).filter(|b| !b.trim().is_empty()))
}
