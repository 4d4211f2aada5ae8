use crate::state::FleetState;
use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};
use deskfleet_model::HostStatus;

fn status_color(status: HostStatus) -> Color {
    match status {
        HostStatus::Ok => Color::Green,
        HostStatus::Partial => Color::Yellow,
        HostStatus::Failure => Color::Red,
    }
}

/// Renders the current fleet table for the terminal.
pub fn render(fleet: &FleetState) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Host").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Idle (s)").add_attribute(Attribute::Bold),
            Cell::new("CPU").add_attribute(Attribute::Bold),
            Cell::new("Memory").add_attribute(Attribute::Bold),
            Cell::new("Processes").add_attribute(Attribute::Bold),
            Cell::new("Observations").add_attribute(Attribute::Bold),
        ]);

    for state in fleet.states() {
        table.add_row(vec![
            Cell::new(&state.host),
            Cell::new(state.status.to_string()).fg(status_color(state.status)),
            Cell::new(number_or_dash(state.idle_seconds)),
            Cell::new(number_or_dash(state.cpu_load)),
            Cell::new(number_or_dash(state.memory_load)),
            Cell::new(
                state
                    .process_count()
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&state.observations),
        ]);
    }

    table
}

fn number_or_dash(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string())
}
