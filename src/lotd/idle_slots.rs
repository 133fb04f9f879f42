//! Idle-slot index for a single VM.

/// Given a VM's busy `[start, end)` intervals (unsorted, possibly overlapping),
/// returns the idle gaps in ascending start order: any leading gap before the
/// first busy interval, the gaps between merged busy intervals, and a trailing
/// open gap `[last_busy_end, +inf)`.
pub fn idle_slots(busy: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if busy.is_empty() {
        return vec![(0.0, f64::INFINITY)];
    }
    let mut sorted = busy.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => {
                *last_end = last_end.max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    let mut slots = Vec::with_capacity(merged.len() + 1);
    if merged[0].0 > 0.0 {
        slots.push((0.0, merged[0].0));
    }
    for window in merged.windows(2) {
        let (_, prev_end) = window[0];
        let (next_start, _) = window[1];
        if next_start > prev_end {
            slots.push((prev_end, next_start));
        }
    }
    slots.push((merged.last().unwrap().1, f64::INFINITY));
    slots
}

/// True if `[start, end]` overlaps any interval in `busy` beyond `epsilon`
/// tolerance — used as the final safety re-check before a duplicate is committed.
pub fn overlaps(busy: &[(f64, f64)], start: f64, end: f64, epsilon: f64) -> bool {
    busy.iter().any(|&(b_start, b_end)| start < b_end - epsilon && b_start < end - epsilon)
}
