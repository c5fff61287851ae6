use ulid::Ulid;

use crate::model::{LayoutAssignment, TimeWindow};

// ── Day layout packing ───────────────────────────────────────────

/// Assign each booking of a day to a rendering column so that no two
/// overlapping bookings share a column, and report per booking how many
/// columns its time range has to share horizontal space with.
///
/// Greedy interval partitioning: bookings sorted by ascending start
/// (stable, so equal starts keep input order — this makes the output a
/// pure function of the input *set*), each placed into the first column
/// whose last booking has ended. The per-booking `total_columns` is then
/// the number of distinct columns among the booking and everything
/// overlapping it, so a booking overlapping a single neighbour renders
/// at half width even when some unrelated pile elsewhere in the day
/// needs four columns.
///
/// Status filtering is the caller's business; the packer lays out
/// whatever it is handed.
pub fn pack_columns(items: &[(Ulid, TimeWindow)]) -> Vec<LayoutAssignment> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&i| items[i].1.start);

    // First pass: first-fit column assignment in start order.
    let mut column_ends: Vec<u16> = Vec::new();
    let mut column_of = vec![0u32; items.len()];
    for &i in &order {
        let window = items[i].1;
        match column_ends.iter().position(|&end| end <= window.start) {
            Some(col) => {
                column_ends[col] = window.end;
                column_of[i] = col as u32;
            }
            None => {
                column_of[i] = column_ends.len() as u32;
                column_ends.push(window.end);
            }
        }
    }

    // Second pass: width divisor = distinct columns touched by the
    // booking's overlap set (itself included).
    let mut assignments = Vec::with_capacity(items.len());
    for &i in &order {
        let window = items[i].1;
        let mut seen = vec![false; column_ends.len()];
        let mut distinct = 0u32;
        for (j, (_, other)) in items.iter().enumerate() {
            if (j == i || other.overlaps(&window)) && !seen[column_of[j] as usize] {
                seen[column_of[j] as usize] = true;
                distinct += 1;
            }
        }
        assignments.push(LayoutAssignment {
            booking_id: items[i].0,
            column_index: column_of[i],
            total_columns: distinct.max(1),
        });
    }
    assignments
}
