use std::fs;
use std::path::Path;

use miette::{bail, IntoDiagnostic, Result};

use crate::error;
use crate::lexer::{tokenize, TokenKind};
use crate::machine::MEMORY_SIZE;

/// Parse program text into the bytes to place in memory from address 0.
///
/// Each byte is written as up to 8 binary digits, separated by whitespace. `#` starts a comment
/// which runs to the end of the line.
pub fn parse(src: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in tokenize(src) {
        match token.kind {
            TokenKind::Comment | TokenKind::Whitespace => continue,
            TokenKind::Unknown => return Err(error::load_unknown(token.span, src)),
            TokenKind::Bits => {
                let text = token.text(src);
                if text.len() > 8 {
                    return Err(error::load_too_wide(token.span, src));
                }
                if bytes.len() == MEMORY_SIZE {
                    let size = tokenize(src)
                        .filter(|tok| tok.kind == TokenKind::Bits)
                        .count();
                    return Err(error::load_too_large(token.span, src, size));
                }
                let byte = u8::from_str_radix(text, 2)
                    .map_err(|_| error::load_unknown(token.span, src))?;
                bytes.push(byte);
            }
        }
    }
    Ok(bytes)
}

/// Check a raw memory image fits in memory.
pub fn from_binary(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if bytes.len() > MEMORY_SIZE {
        bail!(
            code = "load::too_large",
            help = "programs must fit in 256 bytes of memory",
            "Binary image is {} bytes long and cannot fit in memory",
            bytes.len()
        );
    }
    Ok(bytes)
}

/// Read a program from disk: `.ls8` files are text, `.bin` files are raw memory images.
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        bail!("File has no extension. Exiting...");
    };
    match ext {
        "ls8" => {
            let src = fs::read_to_string(path).into_diagnostic()?;
            parse(&src)
        }
        "bin" => from_binary(fs::read(path).into_diagnostic()?),
        _ => bail!("File has unknown extension. Exiting..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_with_comments() {
        let src = "\
# Print the number 8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        assert_eq!(
            parse(src).unwrap(),
            vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]
        );
    }

    #[test]
    fn short_literals() {
        assert_eq!(parse("1 10\t101\r\n").unwrap(), vec![1, 2, 5]);
        assert_eq!(parse("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse("# only a comment").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_bad_tokens() {
        let err = parse("10000010 LDI").unwrap_err();
        assert_eq!(err.to_string(), "Encountered an unknown token");

        let err = parse("100000000").unwrap_err();
        assert_eq!(err.to_string(), "Binary literal does not fit in a byte");
    }

    #[test]
    fn rejects_oversized_program() {
        let src = "0\n".repeat(MEMORY_SIZE);
        assert_eq!(parse(&src).unwrap().len(), MEMORY_SIZE);

        let src = "0\n".repeat(MEMORY_SIZE + 2);
        let err = parse(&src).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Program is 258 bytes long and cannot fit in memory"
        );
    }

    #[test]
    fn binary_images() {
        assert_eq!(from_binary(vec![1, 2, 3]).unwrap(), vec![1, 2, 3]);
        assert!(from_binary(vec![0; MEMORY_SIZE + 1]).is_err());
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_file(Path::new("program.txt")).unwrap_err();
        assert_eq!(err.to_string(), "File has unknown extension. Exiting...");
        let err = load_file(Path::new("program")).unwrap_err();
        assert_eq!(err.to_string(), "File has no extension. Exiting...");
    }
}
