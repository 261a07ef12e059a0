//! Post-parse comment attachment.
//!
//! The grammar engine records comments keyed by byte offset while it runs;
//! once the tree is built, every comment is attached to exactly one node as
//! either `leading` or `trailing`, found by a binary search over each tree
//! level in document order.

use crate::error::Error;
use crate::events::Comment;
use crate::tree::{Document, Node};

pub(crate) fn attach_comments(documents: &[Document], comments: Vec<Comment>) -> Result<(), Error> {
    if documents.is_empty() {
        return Ok(());
    }
    for comment in comments {
        let doc = document_for(documents, &comment);
        attach_in_document(doc, comment)?;
    }
    Ok(())
}

/// The document containing the comment, or the nearest one before it, or
/// the first one.
fn document_for<'a>(documents: &'a [Document], comment: &Comment) -> &'a Document {
    let start = comment.location.start;
    let mut best = &documents[0];
    for doc in documents {
        if let Some(loc) = &doc.location {
            if loc.start <= start {
                best = doc;
            } else {
                break;
            }
        }
    }
    best
}

fn attach_in_document(doc: &Document, comment: Comment) -> Result<(), Error> {
    let Some(root) = doc.root() else {
        return Ok(());
    };
    let start = comment.location.start;
    let end = comment.location.end;

    let mut level = vec![root.clone()];
    let mut enclosing: Option<Node> = None;
    let mut preceding: Option<Node> = None;
    let mut following: Option<Node> = None;

    loop {
        let mut lo = 0usize;
        let mut hi = level.len();
        let mut descend: Option<Node> = None;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let node = &level[mid];
            let Some(loc) = node.location() else {
                return Err(Error::Internal(
                    "node without a location during comment attachment".into(),
                ));
            };
            if loc.start <= start && end <= loc.end {
                descend = Some(node.clone());
                break;
            } else if loc.end <= start {
                preceding = Some(node.clone());
                lo = mid + 1;
            } else if end <= loc.start {
                following = Some(node.clone());
                hi = mid;
            } else {
                return Err(Error::Internal("comment overlaps a node span".into()));
            }
        }
        match descend {
            Some(node) => {
                let children = node.children();
                enclosing = Some(node);
                if children.is_empty() {
                    break;
                }
                level = children;
            }
            None => break,
        }
    }

    if comment.inline {
        if let Some(node) = preceding {
            node.push_trailing(comment);
        } else if let Some(node) = following.or(enclosing) {
            node.push_leading(comment);
        } else {
            root.push_leading(comment);
        }
    } else if let Some(node) = following {
        node.push_leading(comment);
    } else if let Some(node) = preceding {
        node.push_trailing(comment);
    } else if let Some(node) = enclosing {
        node.push_leading(comment);
    } else {
        root.push_leading(comment);
    }
    Ok(())
}
