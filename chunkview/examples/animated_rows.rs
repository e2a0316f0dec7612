// Example: per-row spinners driven by one global timer.
//
// Moving the cursor re-decorates rows but never advances a spinner; only scheduler ticks do.
use chunkview::{
    AnimatedFormatter, AnimatedRender, AnimationConfig, AnimationScheduler, Data, DataSource,
    Fetch, FormatError, ItemRequest, ListView, LoadTicket, RefreshTrigger, RenderPipeline,
    RowContext, SourceError, StateMap, StateValue, ViewportConfig,
};

struct Jobs;

impl DataSource for Jobs {
    type Item = String;
    type Key = u64;

    fn total(&self) -> usize {
        40
    }

    fn fetch(
        &self,
        request: &ItemRequest,
        _ticket: LoadTicket,
    ) -> Result<Fetch<String, u64>, SourceError> {
        Ok(Fetch::Ready(
            (request.start..request.start + request.count)
                .map(|i| Data::new(i as u64, format!("job-{i}")))
                .collect(),
        ))
    }
}

struct Spinner;

impl AnimatedFormatter<String, u64> for Spinner {
    fn render_animated(
        &self,
        item: &Data<String, u64>,
        state: &StateMap,
        _now_ms: u64,
    ) -> Result<AnimatedRender, FormatError> {
        const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
        let n = state.get("n").and_then(StateValue::as_int).unwrap_or(-1) + 1;
        let mut next = StateMap::new();
        next.insert("n".into(), n.into());
        Ok(AnimatedRender {
            content: format!("{} {}", FRAMES[(n % 4) as usize], item.item),
            state: next,
            // Odd rows spin twice as fast.
            triggers: vec![RefreshTrigger::timer(if item.id % 2 == 1 { 100 } else { 200 })],
        })
    }

    fn decorate(&self, content: &str, ctx: &RowContext) -> String {
        if ctx.is_cursor {
            format!("[{content}]")
        } else {
            format!(" {content} ")
        }
    }
}

fn main() {
    let mut view = ListView::new(ViewportConfig::new(4), Jobs).expect("height is not zero");
    let mut scheduler =
        AnimationScheduler::new(AnimationConfig::default().with_tick_interval_ms(100));
    let mut pipeline = RenderPipeline::new(|d: &Data<String>, _: &RowContext| d.item.clone());
    pipeline.set_animated_formatter(chunkview::CatchUnwind(Spinner));

    let mut now = 0;
    while now <= 400 {
        if scheduler.is_due(now) {
            let dirty = scheduler.tick(now);
            println!("t={now} dirty={dirty:?}");
        }
        let frame = pipeline.render(view.navigator(), view.cache(), &mut scheduler, now);
        println!("t={now}: {}", frame.lines().collect::<Vec<_>>().join(" | "));
        let _ = view.move_down();
        now += 50;
    }
}
