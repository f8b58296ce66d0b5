//! Diff-row classifier (§4.2). Consumes an already-tokenized table row (one
//! `<tr>` from the compare endpoint's HTML) and assigns it exactly one tag.
//! Tokenizing the HTML itself is a collaborator's job (see [`crate::html`]);
//! this module only classifies already-parsed cells.

use crate::error::UnclassifiedRow;

/// One `<td>` cell of a diff row: its class attribute and text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub class: String,
    pub text: String,
    /// `href` of an anchor inside the cell, when the row is a moved-block
    /// variant linking to its paired side (e.g. `#moved_para_1_2_lhs`).
    pub anchor: Option<String>,
}

impl Cell {
    pub fn new(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            text: text.into(),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

/// A parsed diff row: its ordered cells.
#[derive(Debug, Clone, Default)]
pub struct DiffRow {
    pub cells: Vec<Cell>,
}

impl DiffRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }
}

/// The classification of a single diff row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    Unedited { text: String },
    NewContent { added: String },
    MovedRight { added: String, lhs_text: String },
    Removal { removed: String },
    MovedLeft { removed: String },
    Modification { old: String, new: String },
    LineNumber,
}

fn class_of(cell: &Cell) -> &str {
    &cell.class
}

/// Classifies one diff row. Anything that matches none of the known shapes
/// in §4.2 is an [`UnclassifiedRow`].
pub fn classify(row: &DiffRow) -> Result<RowClass, UnclassifiedRow> {
    let cells = &row.cells;
    let unclassified = || UnclassifiedRow {
        cells: cells.iter().map(|c| format!("{c:?}")).collect(),
    };

    match cells.len() {
        2 => {
            if class_of(&cells[0]) == "diff-lineno" && class_of(&cells[1]) == "diff-lineno" {
                Ok(RowClass::LineNumber)
            } else {
                Err(unclassified())
            }
        }
        3 => {
            if class_of(&cells[0]) == "diff-empty" && class_of(&cells[2]) == "diff-addedline" {
                if let Some(anchor) = &cells[1].anchor {
                    Ok(RowClass::MovedRight {
                        added: cells[2].text.clone(),
                        lhs_text: anchor.clone(),
                    })
                } else {
                    Ok(RowClass::NewContent {
                        added: cells[2].text.clone(),
                    })
                }
            } else if class_of(&cells[1]) == "diff-deletedline" && class_of(&cells[2]) == "diff-empty"
            {
                if cells[1].anchor.is_some() {
                    Ok(RowClass::MovedLeft {
                        removed: cells[1].text.clone(),
                    })
                } else {
                    Ok(RowClass::Removal {
                        removed: cells[1].text.clone(),
                    })
                }
            } else {
                Err(unclassified())
            }
        }
        4 => {
            if cells[1].text == cells[3].text {
                Ok(RowClass::Unedited {
                    text: cells[1].text.clone(),
                })
            } else if class_of(&cells[1]) == "diff-deletedline"
                && class_of(&cells[3]) == "diff-addedline"
            {
                Ok(RowClass::Modification {
                    old: cells[1].text.clone(),
                    new: cells[3].text.clone(),
                })
            } else {
                Err(unclassified())
            }
        }
        _ => Err(unclassified()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unedited_requires_matching_text() {
        let row = DiffRow::new(vec![
            Cell::new("diff-lineno", "1"),
            Cell::new("diff-context", "Hello."),
            Cell::new("diff-lineno", "1"),
            Cell::new("diff-context", "Hello."),
        ]);
        assert_eq!(
            classify(&row).unwrap(),
            RowClass::Unedited {
                text: "Hello.".into()
            }
        );
    }

    #[test]
    fn new_content_without_anchor_is_plain_add() {
        let row = DiffRow::new(vec![
            Cell::new("diff-empty", ""),
            Cell::new("diff-lineno", "2"),
            Cell::new("diff-addedline", "Hi back."),
        ]);
        assert_eq!(
            classify(&row).unwrap(),
            RowClass::NewContent {
                added: "Hi back.".into()
            }
        );
    }

    #[test]
    fn new_content_with_anchor_is_moved_right() {
        let row = DiffRow::new(vec![
            Cell::new("diff-empty", ""),
            Cell::new("diff-lineno", "2").with_anchor("moved_para_1_lhs"),
            Cell::new("diff-addedline", "Hello, world."),
        ]);
        assert_eq!(
            classify(&row).unwrap(),
            RowClass::MovedRight {
                added: "Hello, world.".into(),
                lhs_text: "moved_para_1_lhs".into(),
            }
        );
    }

    #[test]
    fn removal_without_anchor_deletes() {
        let row = DiffRow::new(vec![
            Cell::new("diff-lineno", "3"),
            Cell::new("diff-deletedline", "Hi back."),
            Cell::new("diff-empty", ""),
        ]);
        assert_eq!(
            classify(&row).unwrap(),
            RowClass::Removal {
                removed: "Hi back.".into()
            }
        );
    }

    #[test]
    fn removal_with_anchor_is_moved_left() {
        let row = DiffRow::new(vec![
            Cell::new("diff-lineno", "3"),
            Cell::new("diff-deletedline", "Hello, world.").with_anchor("moved_para_1_lhs"),
            Cell::new("diff-empty", ""),
        ]);
        assert_eq!(
            classify(&row).unwrap(),
            RowClass::MovedLeft {
                removed: "Hello, world.".into()
            }
        );
    }

    #[test]
    fn modification_requires_deleted_then_added_classes() {
        let row = DiffRow::new(vec![
            Cell::new("diff-lineno", "1"),
            Cell::new("diff-deletedline", "Hello."),
            Cell::new("diff-lineno", "1"),
            Cell::new("diff-addedline", "Hello, world."),
        ]);
        assert_eq!(
            classify(&row).unwrap(),
            RowClass::Modification {
                old: "Hello.".into(),
                new: "Hello, world.".into(),
            }
        );
    }

    #[test]
    fn line_number_row_is_recognized() {
        let row = DiffRow::new(vec![Cell::new("diff-lineno", "1"), Cell::new("diff-lineno", "1")]);
        assert_eq!(classify(&row).unwrap(), RowClass::LineNumber);
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let row = DiffRow::new(vec![Cell::new("diff-context", "?")]);
        assert!(classify(&row).is_err());
    }
}
