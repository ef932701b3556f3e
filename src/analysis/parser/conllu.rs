//! CoNLL-U reader.
//!
//! CoNLL-U is the exchange format of Universal Dependencies and the output
//! format of UDPipe, Stanza and most current dependency parsers. One token per
//! line, ten tab-separated columns, sentences separated by blank lines:
//!
//! ```text
//! # text = 他吃了苹果
//! 1	他	他	PRON	PN	_	2	nsubj	2:nsubj	_
//! 2	吃	吃	VERB	VV	_	0	root	0:root	_
//! 3	了	了	AUX	AS	_	2	aux	2:aux	_
//! 4	苹果	苹果	NOUN	NN	_	2	obj	2:obj	SpaceAfter=No
//! ```
//!
//! Multiword-token ranges (`1-2`) and empty nodes (`8.1`) are skipped; only
//! syntactic words take part in the tree.

use crate::analysis::parser::{ParsedSentence, ParsedToken};
use crate::error::{BionicError, Result};

const COLUMNS: usize = 10;

/// Parse CoNLL-U text into sentences.
pub fn parse_conllu(input: &str) -> Result<Vec<ParsedSentence>> {
    let mut sentences = Vec::new();
    let mut current = ParsedSentence::default();

    for (line_no, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if let Some((key, value)) = comment.split_once('=') {
                if key.trim() == "text" {
                    current.text = Some(value.trim().to_string());
                }
            }
            continue;
        }

        if let Some(token) = parse_line(line, line_no + 1, current.len())? {
            current.tokens.push(token);
        }
    }

    if !current.is_empty() {
        sentences.push(current);
    }

    Ok(sentences)
}

fn malformed(line_no: usize, msg: impl std::fmt::Display) -> BionicError {
    BionicError::analysis(format!("malformed CoNLL-U at line {line_no}: {msg}"))
}

fn parse_line(line: &str, line_no: usize, previous: usize) -> Result<Option<ParsedToken>> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != COLUMNS {
        return Err(malformed(
            line_no,
            format!("expected {COLUMNS} columns, found {}", columns.len()),
        ));
    }

    let id = columns[0];
    if id.contains('-') || id.contains('.') {
        return Ok(None);
    }

    let id: usize = id
        .parse()
        .map_err(|_| malformed(line_no, format!("invalid token id '{id}'")))?;
    if id != previous + 1 {
        return Err(malformed(
            line_no,
            format!("token id {id} does not follow {previous}"),
        ));
    }

    let head: usize = columns[6]
        .parse()
        .map_err(|_| malformed(line_no, format!("invalid head '{}'", columns[6])))?;

    let pos = if columns[3] != "_" {
        columns[3]
    } else {
        columns[4]
    };

    let mut token = ParsedToken::new(columns[1], head, columns[7], pos);
    for (extra_head, relation) in parse_deps(columns[8]) {
        if extra_head != head || relation != token.relation {
            token = token.with_extra(extra_head, relation);
        }
    }

    Ok(Some(token))
}

/// Enhanced dependencies, `head:relation` pairs separated by `|`.
///
/// Pairs pointing at empty nodes (`5.1:nsubj`) are dropped.
fn parse_deps(column: &str) -> Vec<(usize, String)> {
    if column == "_" {
        return Vec::new();
    }

    column
        .split('|')
        .filter_map(|pair| {
            let (head, relation) = pair.split_once(':')?;
            let head = head.parse::<usize>().ok()?;
            Some((head, relation.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# sent_id = 1\n\
# text = 他吃了苹果\n\
1\t他\t他\tPRON\tPN\t_\t2\tnsubj\t2:nsubj\t_\n\
2\t吃\t吃\tVERB\tVV\t_\t0\troot\t0:root\t_\n\
3\t了\t了\tAUX\tAS\t_\t2\taux\t2:aux\t_\n\
4\t苹果\t苹果\tNOUN\tNN\t_\t2\tobj\t2:obj\tSpaceAfter=No\n\
\n\
1\t走\t走\tVERB\tVV\t_\t0\troot\t_\t_\n";

    #[test]
    fn test_parse_sentences() {
        let sentences = parse_conllu(SAMPLE).unwrap();
        assert_eq!(sentences.len(), 2);

        let first = &sentences[0];
        assert_eq!(first.text.as_deref(), Some("他吃了苹果"));
        assert_eq!(first.len(), 4);
        assert_eq!(first.tokens[0].form, "他");
        assert_eq!(first.tokens[0].head, 2);
        assert_eq!(first.tokens[0].relation, "nsubj");
        assert_eq!(first.tokens[3].pos, "NOUN");
        assert!(first.tokens.iter().all(|t| t.extra.is_empty()));

        assert_eq!(sentences[1].tokens[0].form, "走");
        assert!(sentences[1].text.is_none());
    }

    #[test]
    fn test_enhanced_dependencies() {
        let input = "1\t我\t我\tPRON\t_\t_\t2\tnsubj\t2:nsubj\t_\n\
2\t请\t请\tVERB\t_\t_\t0\troot\t0:root\t_\n\
3\t他\t他\tPRON\t_\t_\t2\tobj\t2:obj|4:nsubj:xsubj\t_\n\
4\t吃饭\t吃饭\tVERB\t_\t_\t2\txcomp\t2:xcomp\t_\n";
        let sentences = parse_conllu(input).unwrap();
        let pivot = &sentences[0].tokens[2];
        assert_eq!(pivot.extra, vec![(4, "nsubj:xsubj".to_string())]);
    }

    #[test]
    fn test_skips_ranges_and_empty_nodes() {
        let input = "1-2\tvámonos\t_\t_\t_\t_\t_\t_\t_\t_\n\
1\tvamos\tir\tVERB\t_\t_\t0\troot\t_\t_\n\
2\tnos\tnosotros\tPRON\t_\t_\t1\tobj\t_\t_\n\
2.1\t_\t_\t_\t_\t_\t_\t_\t1:obj\t_\n";
        let sentences = parse_conllu(input).unwrap();
        assert_eq!(sentences[0].len(), 2);
    }

    #[test]
    fn test_falls_back_to_xpos() {
        let input = "1\t走\t走\t_\tVV\t_\t0\troot\t_\t_\n";
        let sentences = parse_conllu(input).unwrap();
        assert_eq!(sentences[0].tokens[0].pos, "VV");
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_conllu("1\t他\tPRON\n").unwrap_err().is_analysis());
        assert!(parse_conllu("x\t他\t他\tPRON\t_\t_\t0\troot\t_\t_\n").is_err());
        assert!(parse_conllu("2\t他\t他\tPRON\t_\t_\t0\troot\t_\t_\n").is_err());
        assert!(parse_conllu("1\t他\t他\tPRON\t_\t_\t_\troot\t_\t_\n").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_conllu("\n\n# comment only\n").unwrap().is_empty());
    }
}
