//! Multi-level XSB file container: `;`-prefixed comment lines and blank
//! lines both separate one level's text from the next.

use std::fs;

use crate::board::Board;
use crate::error::LevelError;

fn flush(current: &mut String, boards: &mut Vec<Board>) -> Result<(), LevelError> {
    if !current.trim().is_empty() {
        boards.push(Board::from_text(current)?);
    }
    current.clear();
    Ok(())
}

/// A collection of Sokoban levels parsed from one XSB-formatted file.
#[derive(Debug)]
pub struct Levels {
    boards: Vec<Board>,
}

impl Levels {
    /// Parse XSB-formatted Sokoban levels from a string. Lines starting
    /// with `;` are comments and, like blank lines, end the level
    /// currently being accumulated.
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut boards = Vec::new();
        let mut current = String::new();

        for line in contents.lines() {
            if line.trim_start().starts_with(';') || line.is_empty() {
                flush(&mut current, &mut boards)?;
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        flush(&mut current, &mut boards)?;

        Ok(Levels { boards })
    }

    pub fn from_file(path: &str) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    pub fn get(&self, index: usize) -> Option<&Board> {
        self.boards.get(index)
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_levels_separated_by_comments_and_blanks() {
        let level1 = "#####\n#@$.#\n#####";
        let level2 = "########\n#@ $  .#\n########";

        let xsb_content = format!("; 1\n\n{level1}\n\n; 2\n\n{level2}\n");
        let levels = Levels::from_text(&xsb_content).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(0).unwrap().to_string().trim_end(), level1);
        assert_eq!(levels.get(1).unwrap().to_string().trim_end(), level2);
    }

    #[test]
    fn invalid_level_in_the_middle_of_a_file_propagates_its_error() {
        let xsb_content = "; 1\n\n#####\n#@@ #\n#####\n";
        let result = Levels::from_text(xsb_content);
        assert!(matches!(result, Err(LevelError::MultiplePlayers)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result, Err(LevelError::Io(_))));
    }
}
