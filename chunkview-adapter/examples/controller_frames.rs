use chunkview::{
    AnimatedFormatter, AnimatedRender, Data, FormatError, RefreshTrigger, RowContext, StateMap,
    StateValue, ViewportConfig,
};
use chunkview_adapter::{Command, ListController, MemorySource};

struct Progress;

impl AnimatedFormatter<String, u64> for Progress {
    fn render_animated(
        &self,
        item: &Data<String, u64>,
        state: &StateMap,
        _now_ms: u64,
    ) -> Result<AnimatedRender, FormatError> {
        let pct = (state.get("pct").and_then(StateValue::as_int).unwrap_or(-10) + 10).min(100);
        let mut next = StateMap::new();
        next.insert("pct".into(), pct.into());
        Ok(AnimatedRender {
            content: format!("{:<10} {pct:>3}%", item.item),
            state: next,
            triggers: vec![RefreshTrigger::timer(120)],
        })
    }
}

fn main() {
    // Example: the host loop of a terminal app, without the terminal.
    //
    // A real host would:
    // 1) translate key presses into `Command`s and `push` them
    // 2) arm one timer for `next_tick_at()`
    // 3) call `frame(now_ms)` on input or when the timer fires, and draw the returned rows
    let source = MemorySource::from_items((0..200).map(|i| format!("download-{i}")));
    let mut c = ListController::new(
        ViewportConfig::new(5),
        source,
        |d: &Data<String>, _: &RowContext| d.item.clone(),
    )
    .expect("height is not zero");
    c.set_animated_formatter(Progress);

    let keys = [
        Command::MoveDown,
        Command::MoveDown,
        Command::PageDown,
        Command::ToggleSelected,
        Command::MoveUp,
    ];
    let mut now = 0;
    for command in keys {
        c.push(command);
        let frame = c.frame(now);
        println!("t={now} next_tick={:?}", c.next_tick_at());
        for line in frame.lines() {
            println!("  {line}");
        }
        now += 60;
    }
    println!("selected ids: {:?}", c.view().selected_ids());
}
