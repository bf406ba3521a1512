/// CSV rendering of analysis results — backs the dashboard's download
/// affordance.
///
/// One row per conflict, deterministic for a given result.
use crate::model::report::AnalysisResult;
use anyhow::Context;

/// Render the conflict table as CSV.
///
/// Container lists are joined with `;` so the file stays one-row-per-
/// conflict in spreadsheet tools.
pub fn conflicts_to_csv(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "type",
        "severity",
        "destination",
        "containers",
        "note",
        "fix",
        "suggested_source",
    ])?;
    for conflict in &result.conflicts {
        let containers = conflict.containers.join(";");
        writer.write_record([
            conflict.kind.label(),
            conflict.severity.label(),
            conflict.destination.as_deref().unwrap_or(""),
            containers.as_str(),
            conflict.note.as_str(),
            conflict.fix.description.as_str(),
            conflict.fix.suggested_source.as_deref().unwrap_or(""),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .context("flushing csv writer")?;
    String::from_utf8(bytes).context("csv output was not valid utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::{Container, Mount, MountMode, Snapshot};

    #[test]
    fn empty_result_is_header_only() {
        let result = analyze(&Snapshot::default());
        let csv = conflicts_to_csv(&result).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("type,severity,destination"));
    }

    #[test]
    fn collision_renders_one_row() {
        let mut x = Container::new("aaa", "sonarr", "img");
        x.mounts = vec![Mount::new("/mnt/user/downloads", "/downloads", MountMode::Rw)];
        let mut y = Container::new("bbb", "qbit", "img");
        y.mounts = vec![Mount::new("/mnt/user/media", "/downloads", MountMode::Rw)];

        let result = analyze(&Snapshot::from_containers(vec![x, y]));
        let csv = conflicts_to_csv(&result).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("destination_collision,critical,/downloads"));
        assert!(rows[1].contains("aaa;bbb"));
    }
}
