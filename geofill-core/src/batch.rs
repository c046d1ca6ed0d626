use anyhow::Result;
use std::collections::HashSet;
use std::io::Write;
use std::time::Duration;

use crate::geocoding::Geocoder;
use crate::table::{format_entry, format_placeholder};
use crate::GeofillConfig;

/// Waits between consecutive lookups
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Pacer that blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleepPacer;

impl Pacer for ThreadSleepPacer {
    fn pause(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Outcome of one geocoding batch
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    /// Locations that fell back to the default coordinates, in lookup order
    pub failed: Vec<String>,
}

impl BatchSummary {
    /// Write the closing summary block
    pub fn write_report<W: Write>(&self, out: &mut W, max_listed: usize) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "// ========================================")?;
        writeln!(out, "// Geocoding complete!")?;
        writeln!(out, "// Success: {}/{}", self.succeeded, self.attempted)?;

        if !self.failed.is_empty() {
            let listed: Vec<&str> = self
                .failed
                .iter()
                .take(max_listed)
                .map(String::as_str)
                .collect();
            writeln!(out, "// Failed ({}): {}", self.failed.len(), listed.join(", "))?;

            if self.failed.len() > max_listed {
                writeln!(out, "//   ... and {} more", self.failed.len() - max_listed)?;
            }
        }

        writeln!(out, "// ========================================")?;
        Ok(())
    }
}

/// Sorted locations present in `all` but not in `existing`, optionally capped.
/// A limit of zero is treated as no limit.
pub fn plan_pending(
    all: &HashSet<String>,
    existing: &HashSet<String>,
    limit: Option<usize>,
) -> Vec<String> {
    let mut pending: Vec<String> = all.difference(existing).cloned().collect();
    pending.sort();

    if let Some(limit) = limit.filter(|&limit| limit > 0) {
        pending.truncate(limit);
    }

    pending
}

/// Look up each pending location in order, printing one table line per location.
/// Lookup failures never stop the batch; they become placeholder lines.
pub(crate) fn geocode_pending<G, P, W>(
    pending: &[String],
    geocoder: &G,
    pacer: &mut P,
    out: &mut W,
    config: &GeofillConfig,
) -> Result<BatchSummary>
where
    G: Geocoder + ?Sized,
    P: Pacer + ?Sized,
    W: Write,
{
    let total = pending.len();
    let mut summary = BatchSummary::default();

    for (i, location) in pending.iter().enumerate() {
        writeln!(out, "// [{}/{}] Geocoding: {}...", i + 1, total, location)?;
        out.flush()?;

        let coords = match geocoder.lookup(location) {
            Ok(coords) => coords,
            Err(e) => {
                log::debug!("Geocoding '{}' failed: {:#}", location, e);
                writeln!(out, "// Error geocoding '{}': {:#}", location, e)?;
                None
            }
        };

        summary.attempted += 1;

        match coords {
            Some(coords) => {
                writeln!(out, "{}", format_entry(location, &coords))?;
                summary.succeeded += 1;
            }
            None => {
                log::debug!("No coordinates for '{}', using default", location);
                writeln!(
                    out,
                    "{}",
                    format_placeholder(location, &config.default_coordinates)
                )?;
                summary.failed.push(location.clone());
            }
        }
        out.flush()?;

        // Nominatim usage policy: at most one request per second
        if i + 1 < total {
            pacer.pause(config.delay);
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinates;

    /// Resolves names starting with an uppercase letter, errors on "boom"
    struct RuleGeocoder;

    impl Geocoder for RuleGeocoder {
        fn lookup(&self, location: &str) -> Result<Option<Coordinates>> {
            if location == "boom" {
                anyhow::bail!("connection reset");
            }
            if location.starts_with(|c: char| c.is_uppercase()) {
                Ok(Some(Coordinates::new(31.2518, 34.7913)))
            } else {
                Ok(None)
            }
        }
    }

    #[derive(Default)]
    struct RecordingPacer(Vec<Duration>);

    impl Pacer for RecordingPacer {
        fn pause(&mut self, delay: Duration) {
            self.0.push(delay);
        }
    }

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn run(pending: &[String]) -> (BatchSummary, RecordingPacer, String) {
        let mut pacer = RecordingPacer::default();
        let mut out = Vec::new();
        let summary = geocode_pending(
            pending,
            &RuleGeocoder,
            &mut pacer,
            &mut out,
            &GeofillConfig::default(),
        )
        .unwrap();
        (summary, pacer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_plan_pending_is_sorted_difference() {
        let all = set(&["Sderot", "Beeri", "Ofakim", "Nir Oz"]);
        let existing = set(&["Ofakim", "Elsewhere"]);

        let pending = plan_pending(&all, &existing, None);
        assert_eq!(pending, names(&["Beeri", "Nir Oz", "Sderot"]));
        assert!(pending.iter().all(|p| all.contains(p) && !existing.contains(p)));
    }

    #[test]
    fn test_plan_pending_limit() {
        let all = set(&["d", "a", "c", "b"]);
        let existing = HashSet::new();

        assert_eq!(plan_pending(&all, &existing, Some(2)), names(&["a", "b"]));
        assert_eq!(plan_pending(&all, &existing, Some(4)), names(&["a", "b", "c", "d"]));
        assert_eq!(plan_pending(&all, &existing, Some(10)), names(&["a", "b", "c", "d"]));
        assert_eq!(plan_pending(&all, &existing, Some(0)), names(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_success_line() {
        let (summary, _, output) = run(&names(&["Gaza"]));

        assert_eq!(summary.succeeded, 1);
        assert!(summary.failed.is_empty());
        assert_eq!(
            output,
            "// [1/1] Geocoding: Gaza...\n  'Gaza': { latitude: 31.2518, longitude: 34.7913 },\n"
        );
    }

    #[test]
    fn test_not_found_becomes_placeholder() {
        let (summary, _, output) = run(&names(&["nowhere"]));

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, names(&["nowhere"]));
        assert!(output.contains("  // FAILED: 'nowhere': { latitude: 31.5, longitude: 34.8 }"));
        assert!(!output.contains("Error geocoding"));
    }

    #[test]
    fn test_lookup_error_is_reported_and_batch_continues() {
        let (summary, _, output) = run(&names(&["boom", "Sderot"]));

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, names(&["boom"]));
        assert!(output.contains("// Error geocoding 'boom': connection reset\n"));
        assert_eq!(output.matches("Error geocoding").count(), 1);
        assert!(output.contains("  // FAILED: 'boom'"));
        assert!(output.contains("  'Sderot': { latitude: 31.2518"));
    }

    #[test]
    fn test_pauses_between_lookups_only() {
        let (_, pacer, _) = run(&names(&["A", "B", "C"]));
        assert_eq!(pacer.0, vec![Duration::from_millis(1100); 2]);

        let (_, pacer, _) = run(&names(&["A"]));
        assert!(pacer.0.is_empty());

        let (_, pacer, _) = run(&[]);
        assert!(pacer.0.is_empty());
    }

    #[test]
    fn test_report_lists_first_failures() -> Result<()> {
        let failed: Vec<String> = (1..=12).map(|i| format!("loc{}", i)).collect();
        let summary = BatchSummary {
            attempted: 20,
            succeeded: 8,
            failed,
        };

        let mut out = Vec::new();
        summary.write_report(&mut out, 10)?;
        let report = String::from_utf8(out)?;

        assert!(report.contains("// Success: 8/20\n"));
        assert!(report.contains(
            "// Failed (12): loc1, loc2, loc3, loc4, loc5, loc6, loc7, loc8, loc9, loc10\n"
        ));
        assert!(report.contains("//   ... and 2 more\n"));

        Ok(())
    }

    #[test]
    fn test_report_without_failures() -> Result<()> {
        let summary = BatchSummary {
            attempted: 3,
            succeeded: 3,
            failed: Vec::new(),
        };

        let mut out = Vec::new();
        summary.write_report(&mut out, 10)?;
        let report = String::from_utf8(out)?;

        assert!(report.contains("// Geocoding complete!"));
        assert!(!report.contains("Failed"));
        assert!(!report.contains("more"));

        Ok(())
    }
}
