// Example: a million-row list that never holds more than three chunks.
use chunkview::{
    AnimationScheduler, Data, DataSource, Fetch, ItemRequest, ListView, LoadTicket,
    RenderPipeline, RowContext, SourceError, ViewportConfig,
};

struct Numbers;

impl DataSource for Numbers {
    type Item = u64;
    type Key = u64;

    fn total(&self) -> usize {
        1_000_000
    }

    fn fetch(
        &self,
        request: &ItemRequest,
        _ticket: LoadTicket,
    ) -> Result<Fetch<u64, u64>, SourceError> {
        let items = (request.start..request.start + request.count)
            .map(|i| Data::new(i as u64, (i as u64) * (i as u64)))
            .collect();
        Ok(Fetch::Ready(items))
    }
}

fn main() {
    let config = ViewportConfig::new(8).with_chunk_size(64);
    let mut view = ListView::new(config, Numbers).expect("height is not zero");
    let mut pipeline = RenderPipeline::new(|d: &Data<u64>, ctx: &RowContext| {
        let marker = if ctx.is_cursor { ">" } else { " " };
        format!("{marker} {:>7}  {}", d.id, d.item)
    });
    let mut scheduler = AnimationScheduler::default();

    for _ in 0..10 {
        let _ = view.move_down();
    }
    let _ = view.jump_to_index(654_321);
    let _ = view.page_down();

    let frame = pipeline.render(view.navigator(), view.cache(), &mut scheduler, 0);
    for line in frame.lines() {
        println!("{line}");
    }
    println!("state={:?}", view.state());
    println!(
        "chunks={:?} fetches={}",
        view.cache().chunk_starts(),
        view.cache().fetch_count()
    );
}
