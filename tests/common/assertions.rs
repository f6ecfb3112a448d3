//! Assertion helpers for tests.

use ctif::{Container, ContainerReader, QuantizedCell};
use pretty_assertions::assert_eq;

/// Assert bytes parse as a container and return it.
pub fn assert_valid_container(bytes: &[u8]) -> Container {
    assert_eq!(&bytes[..4], b"CTIF", "missing magic");
    match ContainerReader::parse(bytes) {
        Ok(container) => container,
        Err(e) => panic!("Expected a valid container, got error: {e}"),
    }
}

/// Assert every cell of frame `index` equals `expected`.
pub fn assert_uniform_frame(container: &Container, index: usize, expected: QuantizedCell) {
    let cells = &container.frames[index].cells;
    assert!(!cells.is_empty(), "frame {index} has no cells");
    let wrong: Vec<(usize, QuantizedCell)> = cells
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, c)| c != expected)
        .collect();
    assert_eq!(wrong, Vec::new(), "frame {index} has cells other than {expected:?}");
}
