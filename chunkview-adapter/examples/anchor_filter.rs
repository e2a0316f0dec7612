use chunkview::{Data, RowContext, ViewportConfig};
use chunkview_adapter::{Command, ListController, MemorySource};

fn main() {
    // Example: keep the cursor on the same item while the user types a filter.
    //
    // The flow is:
    // 1) capture an anchor (item id + cursor row) before the data changes
    // 2) change the source's filter/sort
    // 3) refresh with the anchor so the cursor lands on the same item at the same row
    let names = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"];
    let source = MemorySource::from_items((0..400).map(|i| format!("{}-{i}", names[i % 8])));
    let mut c = ListController::new(
        ViewportConfig::new(6),
        source,
        |d: &Data<String>, ctx: &RowContext| {
            format!("{} {}", if ctx.is_cursor { ">" } else { " " }, d.item)
        },
    )
    .expect("height is not zero");

    c.push(Command::JumpTo(213));
    let _ = c.frame(0);
    let anchor = c
        .capture_cursor_anchor()
        .expect("cursor chunk must be loaded");
    println!("before filter: state={:?} anchor={anchor:?}", c.state());

    c.source().set_filter(|s: &String| s.contains("eta"));
    // The key -> index mapping for the filtered dataset is owned by the host.
    let index: Vec<Option<usize>> = (0..400u64).map(|id| c.source().index_of(&id)).collect();
    let ok = c.refresh_anchored(&anchor, |id| index.get(*id as usize).copied().flatten());

    println!("after filter: ok={ok} state={:?}", c.state());
    for line in c.frame(16).lines() {
        println!("{line}");
    }
}
