// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp;
use core::fmt::{self, Debug, Formatter};
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// A configuration file with a line table for mapping parser offsets back to
/// line and column numbers.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::ptr_eq(&self.src, &other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2; // Account for rows, cols possibly starting at 1, EOF etc.
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed configuration file size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() || lines.is_empty() {
            lines.push((start, contents.len() as u32));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    /// File name without its directory, as shown in issues.
    pub fn file_name(&self) -> &str {
        Path::new(&self.src.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.src.file)
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    /// Span starting at the given byte offset.
    pub fn span_at(&self, offset: usize) -> Result<Span> {
        if offset > self.src.contents.len() {
            return Err(anyhow!(
                "{}: offset {offset} is past the end of the file",
                self.src.file
            ));
        }
        let offset = offset as u32;
        // Index of the last line starting at or before offset.
        let idx = self
            .src
            .lines
            .partition_point(|(start, _)| *start <= offset)
            .saturating_sub(1);
        let (start, _) = self.src.lines[idx];
        let col = self.src.contents[start as usize..offset as usize]
            .chars()
            .count() as u32
            + 1;
        Ok(Span {
            source: self.clone(),
            line: idx as u32 + 1,
            col,
        })
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() || line == 0 {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col.saturating_sub(1) as usize;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
		{:<line_num_width$}| {}\n\
		{:<line_num_width$}| {:<col_spaces$}^\n\
		{}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, "error", msg))
    }
}

/// Position of a syntax element.
#[derive(Clone, PartialEq, Eq)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_fmt(format_args!(
            "{}:{}:{}",
            self.source.file(),
            self.line,
            self.col
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_lines_and_columns() -> Result<()> {
        let source = Source::from_contents(
            "dir/instances.tf".to_string(),
            "resource \"aws_instance\" \"web\" {\r\n  instance_type = \"t2.micro\"\n}\n".to_string(),
        )?;
        let offset = source.contents().find("instance_type").unwrap_or_default();
        let span = source.span_at(offset)?;
        assert_eq!((span.line, span.col), (2, 3));
        assert_eq!(source.line(1), "  instance_type = \"t2.micro\"");
        assert_eq!(source.file_name(), "instances.tf");

        let span = source.span_at(0)?;
        assert_eq!((span.line, span.col), (1, 1));
        Ok(())
    }

    #[test]
    fn error_message_points_at_column() -> Result<()> {
        let source = Source::from_contents("main.tf".to_string(), "a = b\n".to_string())?;
        let msg = source.span_at(4)?.message("error", "bad");
        assert!(msg.contains("--> main.tf:1:5"));
        assert!(msg.contains("|     ^"));
        assert!(msg.ends_with("error: bad"));
        Ok(())
    }

    #[test]
    fn empty_file_has_one_line() -> Result<()> {
        let source = Source::from_contents("empty.tf".to_string(), String::new())?;
        assert_eq!(source.span_at(0)?.line, 1);
        assert!(source.span_at(1).is_err());
        Ok(())
    }
}
