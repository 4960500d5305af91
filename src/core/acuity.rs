use crate::models::AcuityTag;

const HIGH_MOBILITY_MARKERS: [&str; 2] = ["wheelchair", "bedbound"];
const HIGH_TASKS: [&str; 3] = ["bathing", "toileting", "transfers"];
const MEDIUM_MOBILITY_MARKERS: [&str; 2] = ["cane", "walker"];
const MEDIUM_TASKS: [&str; 1] = ["medication reminders"];

/// Derive an acuity tag from a mobility description and requested tasks
///
/// Rules are checked in order and the first match wins, so any high-acuity
/// signal overrides lower ones:
/// 1. HIGH: mobility mentions wheelchair/bedbound, or tasks include bathing,
///    toileting or transfers
/// 2. MEDIUM: mobility mentions cane/walker, or tasks include medication reminders
/// 3. LOW: any other non-empty input
///
/// Returns `None` when both inputs are empty.
pub fn classify_acuity<S: AsRef<str>>(mobility: Option<&str>, tasks: &[S]) -> Option<AcuityTag> {
    let mobility = mobility.map(|m| m.trim().to_lowercase()).unwrap_or_default();
    let tasks: Vec<String> = tasks
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mentions = |markers: &[&str]| markers.iter().any(|m| mobility.contains(m));
    let requests = |wanted: &[&str]| tasks.iter().any(|t| wanted.contains(&t.as_str()));

    if mentions(&HIGH_MOBILITY_MARKERS) || requests(&HIGH_TASKS) {
        return Some(AcuityTag::High);
    }

    if mentions(&MEDIUM_MOBILITY_MARKERS) || requests(&MEDIUM_TASKS) {
        return Some(AcuityTag::Medium);
    }

    if !mobility.is_empty() || !tasks.is_empty() {
        return Some(AcuityTag::Low);
    }

    None
}
