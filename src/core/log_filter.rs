//! Cheap pre-filter on raw log lines.
//!
//! Runs before any network request. False positives are fine: the balance diff of a
//! transaction that moved nothing is dropped later.

/// Case-sensitive substrings that mark an asset transfer or exchange in program logs.
/// `swap` covers aggregator and AMM routes, `transfer` covers plain SPL transfers.
pub const TRANSFER_MARKERS: [&str; 2] = ["swap", "transfer"];

/// Returns `true` if any line mentions a transfer or swap.
#[must_use]
pub fn passes<S: AsRef<str>>(lines: &[S]) -> bool {
    lines.iter().any(|line| {
        let line = line.as_ref();
        TRANSFER_MARKERS.iter().any(|marker| line.contains(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_line_passes() {
        let lines = [
            "Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA invoke [1]",
            "Program log: Instruction: transfer",
        ];
        assert!(passes(&lines));
    }

    #[test]
    fn test_swap_substring_passes() {
        assert!(passes(&["Program log: Instruction: swap_base_in"]));
    }

    #[test]
    fn test_irrelevant_lines_rejected() {
        let lines = [
            "Program ComputeBudget111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: InitializeAccount3",
        ];
        assert!(!passes(&lines));
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert!(!passes(&["Program log: Instruction: Transfer"]));
        assert!(!passes(&["Program log: Instruction: Swap"]));
        assert!(passes(&["Program log: Instruction: TransferChecked", "route swap"]));
    }

    #[test]
    fn test_empty_notification_rejected() {
        let lines: Vec<String> = Vec::new();
        assert!(!passes(&lines));
    }
}
