//! Token pump fanning each token out to every selector.

use crate::ast::Node;
use crate::selector::Selector;
use crate::source::SourceError;
use crate::token::scrub_whitespace;
use crate::tokenizer::{Token, Tokenizer};
use std::io::Read;
use std::sync::Arc;
use std::thread;

/// Pumps tokens from `input` through all `selectors` until the source ends
/// or fails.
///
/// Every token is dispatched to each selector in parallel and fully settled
/// before the next token is scanned, so each selector observes the stream in
/// arrival order while selectors never wait on one another. Close and text
/// events only reach selectors that are mid-subtree; comments and skipped
/// script-content tags reach nobody.
///
/// Running off the end of the stream is the normal way to finish and returns
/// `Ok`; an upstream read failure is returned so the caller can log it and
/// skip the truncated unit of work.
pub fn parse<R: Read>(input: R, selectors: &[Arc<dyn Selector>]) -> Result<(), SourceError> {
    let mut tokenizer = Tokenizer::new(input);

    loop {
        match tokenizer.next_token() {
            Token::Error => break,
            Token::Open(tag) => {
                let node = Node::element(tag);
                fan_out(selectors, |selector| selector.on_open(node.clone()));
            }
            Token::Close(tag) => {
                let node = Node::closing(tag.name);
                fan_out(selectors, |selector| {
                    if selector.has_pending() {
                        selector.on_close(node.clone());
                    }
                });
            }
            Token::Text(raw) => {
                let node = Node::text(scrub_whitespace(raw));
                fan_out(selectors, |selector| {
                    if selector.has_pending() {
                        selector.on_open(node.clone());
                    }
                });
            }
            Token::Comment(_) | Token::Skip => {}
        }
    }

    match tokenizer.into_error() {
        None | Some(SourceError::EndOfStream) => Ok(()),
        Some(err) => Err(err),
    }
}

/// Runs `dispatch` for every selector, joining all of them before returning.
/// A single selector is dispatched inline.
fn fan_out(selectors: &[Arc<dyn Selector>], dispatch: impl Fn(&dyn Selector) + Sync) {
    match selectors {
        [] => {}
        [only] => dispatch(only.as_ref()),
        _ => {
            thread::scope(|scope| {
                let dispatch = &dispatch;
                for selector in selectors {
                    scope.spawn(move || dispatch(selector.as_ref()));
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::ast::TEXT_NODE_NAME;
    use crate::selector::{ClassSelector, Selector};
    use crate::source::SourceError;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Selector on `classes` that records each completed chain as a list of
    /// `(name, content)` pairs.
    fn recording_selector(
        classes: &[&str],
        log: &Arc<Mutex<Vec<Vec<(String, String)>>>>,
    ) -> Arc<dyn Selector> {
        let log = Arc::clone(log);
        Arc::new(ClassSelector::new(
            classes.iter().map(|class| class.to_string()).collect(),
            Box::new(move |tree| {
                let chain = tree
                    .iter()
                    .map(|node| (node.name.clone(), node.content.clone()))
                    .collect();
                log.lock().expect("log mutex").push(chain);
            }),
        ))
    }

    #[test]
    fn completes_sibling_containers_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let selector = recording_selector(&["a"], &log);

        parse(
            &br#"<ul><li class="a">one</li><li class="a">two</li></ul>"#[..],
            &[selector],
        )
        .expect("parse");

        let trees = log.lock().expect("log mutex");
        assert_eq!(
            *trees,
            vec![
                vec![
                    ("li".to_string(), String::new()),
                    (TEXT_NODE_NAME.to_string(), "one".to_string()),
                ],
                vec![
                    ("li".to_string(), String::new()),
                    (TEXT_NODE_NAME.to_string(), "two".to_string()),
                ],
            ]
        );
    }

    #[test]
    fn repairs_misnested_markup() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let selector = recording_selector(&["c"], &log);

        parse(&br#"<p class="c"><b>x</p></b>"#[..], &[selector.clone()]).expect("parse");

        let trees = log.lock().expect("log mutex");
        assert_eq!(
            *trees,
            vec![vec![
                ("p".to_string(), String::new()),
                ("b".to_string(), String::new()),
                (TEXT_NODE_NAME.to_string(), "x".to_string()),
            ]]
        );
        assert!(!selector.has_pending());
    }

    #[test]
    fn selectors_complete_independently() {
        let outer_log = Arc::new(Mutex::new(Vec::new()));
        let inner_log = Arc::new(Mutex::new(Vec::new()));
        let outer = recording_selector(&["a"], &outer_log);
        let inner = recording_selector(&["b"], &inner_log);

        parse(
            &br#"<div class="a"><span class="b">t</span></div>"#[..],
            &[outer, inner],
        )
        .expect("parse");

        let outer_trees = outer_log.lock().expect("outer log mutex");
        assert_eq!(
            *outer_trees,
            vec![vec![
                ("div".to_string(), String::new()),
                ("span".to_string(), String::new()),
                (TEXT_NODE_NAME.to_string(), "t".to_string()),
            ]]
        );

        let inner_trees = inner_log.lock().expect("inner log mutex");
        assert_eq!(
            *inner_trees,
            vec![vec![
                ("span".to_string(), String::new()),
                (TEXT_NODE_NAME.to_string(), "t".to_string()),
            ]]
        );
    }

    #[test]
    fn comments_reach_no_selector() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let selector = recording_selector(&["a"], &log);

        parse(
            &br#"<li class="a"><!-- hidden -->seen</li>"#[..],
            &[selector],
        )
        .expect("parse");

        let trees = log.lock().expect("log mutex");
        assert_eq!(
            *trees,
            vec![vec![
                ("li".to_string(), String::new()),
                (TEXT_NODE_NAME.to_string(), "seen".to_string()),
            ]]
        );
    }

    /// Reader that serves a prefix, then fails.
    struct FailingReader {
        data: &'static [u8],
        offset: usize,
    }

    impl io::Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.offset >= self.data.len() {
                return Err(io::Error::other("connection reset"));
            }
            let n = buf.len().min(self.data.len() - self.offset);
            buf[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
            self.offset += n;
            Ok(n)
        }
    }

    #[test]
    fn mid_stream_read_failure_is_returned() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let selector = recording_selector(&["a"], &log);

        let input = FailingReader {
            data: br#"<li class="a">one</li>"#,
            offset: 0,
        };
        let err = parse(input, &[selector]).expect_err("read failure surfaces");
        assert!(matches!(err, SourceError::Io(_)));

        // Everything completed before the failure was still delivered.
        let trees = log.lock().expect("log mutex");
        assert_eq!(trees.len(), 1);
    }

    #[test]
    fn script_bodies_are_not_materialized() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let selector = recording_selector(&["wrap"], &log);

        parse(
            &br#"<div class="wrap"><script>var x = "<span>";</script><p>ok</p></div>"#[..],
            &[selector],
        )
        .expect("parse");

        let trees = log.lock().expect("log mutex");
        assert_eq!(trees.len(), 1);
        let names: Vec<&str> = trees[0].iter().map(|(name, _)| name.as_str()).collect();
        assert!(!names.contains(&"span"));
        assert!(names.contains(&"p"));
    }
}
