//! `vestindex preview`: release table for a hypothetical grant.

use alloy_primitives::{Address, U256};
use anyhow::{bail, Result};

use vestindex_core::amount::{format_units, parse_whole_units};
use vestindex_core::vesting::VestingSchedule;

/// Upper bound on printed rows.
const MAX_ROWS: usize = 1_000;

/// `(height, released, next unlock)` at each step boundary from `start`.
pub fn release_table(schedule: &VestingSchedule, until: Option<u64>) -> Vec<(u64, U256, Option<u64>)> {
    let mut rows = Vec::new();
    let mut height = schedule.grant_start_height;
    loop {
        let next = schedule.compute_next_unlock_height(height);
        rows.push((height, schedule.compute_released(height), next));
        let Some(next_height) = next else { break };
        if until.is_some_and(|u| next_height > u) || rows.len() >= MAX_ROWS {
            break;
        }
        height = next_height;
    }
    rows
}

pub fn run(
    amount: u64,
    start: u64,
    step: u64,
    interval: u64,
    decimals: u8,
    until: Option<u64>,
) -> Result<()> {
    if interval == 0 || step == 0 {
        bail!("--step and --interval must be greater than zero");
    }
    let schedule = VestingSchedule {
        owner: Address::ZERO,
        spender: Address::ZERO,
        total_granted: parse_whole_units(amount, decimals),
        unlock_step_amount: parse_whole_units(step, decimals),
        grant_start_height: start,
        unlock_interval_heights: interval,
    };

    println!("{:>12}  {:>24}  {:>12}", "height", "released", "next");
    for (height, released, next) in release_table(&schedule, until) {
        let released = format_units(released, decimals);
        let next = next.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        println!("{height:>12}  {released:>24}  {next:>12}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(total: u64, step: u64, start: u64, interval: u64) -> VestingSchedule {
        VestingSchedule {
            owner: Address::ZERO,
            spender: Address::ZERO,
            total_granted: U256::from(total),
            unlock_step_amount: U256::from(step),
            grant_start_height: start,
            unlock_interval_heights: interval,
        }
    }

    #[test]
    fn table_runs_to_full_release() {
        let rows = release_table(&schedule(100, 25, 100, 10), None);
        let heights: Vec<u64> = rows.iter().map(|r| r.0).collect();
        assert_eq!(heights, vec![100, 110, 120, 130]);
        assert_eq!(rows[0].1, U256::from(25u64));
        assert_eq!(rows[3], (130, U256::from(100u64), None));
    }

    #[test]
    fn table_stops_at_until() {
        let rows = release_table(&schedule(1_000, 1, 0, 1), Some(5));
        assert_eq!(rows.len(), 6);
        assert_eq!(rows.last().unwrap().0, 5);
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(run(100, 0, 25, 0, 18, None).is_err());
    }
}
