use std::io::{self, BufRead, Write};

use log::debug;

pub fn print_windows<W: Write>(out: &mut W, titles: &[String]) -> io::Result<()> {
    writeln!(out, "\nAvailable windows:")?;
    for (i, title) in titles.iter().enumerate() {
        writeln!(out, "  [{}] {}", i, title)?;
    }
    Ok(())
}

/// Lists `titles` and reads an index until a valid one is entered.
///
/// Fails with `UnexpectedEof` if input ends before a choice is made.
pub fn pick_window<R: BufRead, W: Write>(
    mut input: R,
    out: &mut W,
    titles: &[String],
) -> io::Result<String> {
    print_windows(out, titles)?;

    loop {
        write!(out, "\nSelect a window index to record: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no window selected",
            ));
        }

        match line.trim().parse::<usize>() {
            Ok(idx) if idx < titles.len() => {
                debug!("Picked window {}: {:?}", idx, titles[idx]);
                return Ok(titles[idx].clone());
            }
            _ => writeln!(out, "Invalid choice. Try again.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn titles() -> Vec<String> {
        vec!["Editor".to_string(), "Terminal".to_string()]
    }

    #[test]
    fn test_pick_valid_index() {
        let mut out = Vec::new();
        let picked = pick_window(Cursor::new("1\n"), &mut out, &titles()).unwrap();
        assert_eq!(picked, "Terminal");

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("  [0] Editor"));
        assert!(shown.contains("  [1] Terminal"));
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let mut out = Vec::new();
        let picked = pick_window(Cursor::new("abc\n7\n 0 \n"), &mut out, &titles()).unwrap();
        assert_eq!(picked, "Editor");

        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Invalid choice. Try again.").count(), 2);
    }

    #[test]
    fn test_eof_without_choice() {
        let mut out = Vec::new();
        let err = pick_window(Cursor::new("9\n"), &mut out, &titles()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
