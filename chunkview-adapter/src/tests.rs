use crate::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use chunkview::{
    AnimatedFormatter, AnimatedRender, AnimationConfig, Completion, Data, DataSource,
    FormatError, ItemRange, RefreshTrigger, RowContext, StateMap, StateValue, ViewEvent,
    ViewportConfig,
};

fn words(n: usize) -> MemorySource<String> {
    MemorySource::from_items((0..n).map(|i| format!("w{i:03}")))
}

fn plain(d: &Data<String>, _: &RowContext) -> String {
    d.item.clone()
}

fn config() -> ViewportConfig {
    ViewportConfig::new(5)
        .with_thresholds(Some(1), Some(3))
        .with_chunk_size(20)
}

struct Spinner {
    calls: Arc<AtomicUsize>,
}

impl AnimatedFormatter<String, u64> for Spinner {
    fn render_animated(
        &self,
        item: &Data<String, u64>,
        state: &StateMap,
        _now_ms: u64,
    ) -> Result<AnimatedRender, FormatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let frame = state.get("frame").and_then(StateValue::as_int).unwrap_or(-1) + 1;
        let glyph = ["|", "/", "-", "\\"][(frame % 4) as usize];
        let mut next = StateMap::new();
        next.insert("frame".into(), StateValue::Int(frame));
        Ok(AnimatedRender {
            content: format!("{glyph} {}", item.item),
            state: next,
            triggers: vec![RefreshTrigger::timer(100)],
        })
    }
}

#[test]
fn memory_source_filters_and_sorts_presentation_order() {
    let source = words(10);
    assert_eq!(source.total(), 10);

    source.set_filter(|w: &String| w.ends_with('1') || w.ends_with('5') || w.ends_with('7'));
    assert_eq!(source.total(), 3);
    source.set_sort(|a: &String, b: &String| b.cmp(a));
    let items = source.resolve(&chunkview::ItemRequest {
        start: 0,
        count: 10,
        query: Default::default(),
    });
    let names: Vec<&str> = items.iter().map(|d| d.item.as_str()).collect();
    assert_eq!(names, vec!["w007", "w005", "w001"]);
    assert_eq!(items[0].id, 7);
    assert_eq!(source.index_of(&1), Some(2));
    assert_eq!(source.index_of(&2), None);

    source.clear_filter();
    source.clear_sort();
    assert_eq!(source.total(), 10);
    assert_eq!(source.len_unfiltered(), 10);
    assert_eq!(source.id_at(4), Some(4));
}

#[test]
fn memory_source_selection_follows_ids_across_sorting() {
    let source = words(6);
    assert!(source.set_selected(1, true));
    assert!(source.set_selected(4, true));
    assert!(!source.set_selected(9, true));
    assert_eq!(source.selected_indices(), vec![1, 4]);

    source.set_sort(|a: &String, b: &String| b.cmp(a));
    assert_eq!(source.selected_indices(), vec![1, 4]);
    assert_eq!(source.selected_ids(), vec![4, 1]);
    assert!(source.is_selected(1));
    assert_eq!(source.id_at(1), Some(4));

    source.set_filter(|w: &String| w != "w004");
    assert_eq!(source.selected_ids(), vec![1]);
    source.select_all();
    assert_eq!(source.selected_indices().len(), 5);
    source.clear_selection();
    assert!(source.selected_ids().is_empty());
}

#[test]
fn controller_applies_queued_commands_per_frame() {
    let mut c = ListController::new(config(), words(100), plain).unwrap();
    let frame = c.frame(0);
    assert_eq!(
        frame.into_lines(),
        vec!["w000", "w001", "w002", "w003", "w004"]
    );

    for _ in 0..7 {
        c.push(Command::MoveDown);
    }
    assert_eq!(c.state().cursor_index, 0);
    assert_eq!(c.pending_commands(), 7);

    let frame = c.frame(16);
    assert_eq!(c.pending_commands(), 0);
    assert_eq!(c.state().cursor_index, 7);
    assert_eq!(c.state().viewport_start, 4);
    assert_eq!(frame.rows[3].text, "w007");
    assert!(frame.rows[3].is_cursor);

    c.push(Command::JumpTo(99));
    c.push(Command::ToggleSelected);
    let _ = c.frame(32);
    assert_eq!(c.view().selected_indices(), vec![99]);
    assert!(c.current_item().is_some_and(|d| d.selected));
    assert_eq!(c.view().cache().chunk_starts(), vec![80]);
}

#[test]
fn controller_ticks_animations_only_when_due() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut c = ListController::new(config(), words(100), plain)
        .unwrap()
        .with_animation_config(AnimationConfig::default().with_tick_interval_ms(100));
    c.set_animated_formatter(Spinner {
        calls: Arc::clone(&calls),
    });
    assert!(!c.is_animation_loop_running());

    let frame = c.frame(0);
    assert_eq!(frame.rows[0].text, "> | w000");
    assert!(c.is_animation_loop_running());
    assert_eq!(c.next_tick_at(), Some(100));
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    // Cursor-only frames before the timer is due re-decorate but never re-render.
    for now in 1..100u64 {
        c.push(if now % 2 == 1 {
            Command::MoveDown
        } else {
            Command::MoveUp
        });
        let _ = c.frame(now);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let frame = c.frame(100);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert!(frame.lines().any(|l| l.ends_with("/ w000")));
}

#[test]
fn controller_clearing_animations_idles_the_loop() {
    let mut c = ListController::new(config(), words(10), plain).unwrap();
    c.set_animated_formatter(Spinner {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let _ = c.frame(0);
    assert!(c.is_animation_loop_running());

    c.disable_animations();
    assert!(!c.is_animation_loop_running());
    assert_eq!(c.next_tick_at(), None);
    c.enable_animations(10);
    assert!(c.is_animation_loop_running());

    c.clear_animated_formatter();
    assert!(!c.is_animation_loop_running());
    assert!(c.scheduler().is_empty());
    let frame = c.frame(20);
    assert_eq!(frame.rows[0].text, "w000");
}

#[test]
fn controller_renders_placeholders_until_deferred_loads_complete() {
    let source = words(50).with_deferred(true);
    let mut c = ListController::new(config(), source, plain)
        .unwrap()
        .with_placeholder("...");
    let frame = c.frame(0);
    assert!(frame.lines().all(|l| l == "..."));

    let pending = c.source().take_pending();
    assert_eq!(pending.len(), 1);
    let (request, ticket) = pending[0].clone();
    assert_eq!((request.start, request.count), (0, 20));

    let items = c.source().resolve(&request);
    assert_eq!(
        c.complete_load(ticket, Ok(items)),
        Ok(Completion::Stored(ItemRange::new(0, 20)))
    );
    let frame = c.frame(16);
    assert_eq!(frame.rows[4].text, "w004");
    assert!(
        c.take_events()
            .iter()
            .any(|e| matches!(e, ViewEvent::ChunkLoaded { .. }))
    );
}

#[test]
fn cursor_anchor_survives_filtering() {
    let mut c = ListController::new(config(), words(100), plain).unwrap();
    c.push(Command::JumpTo(42));
    let _ = c.frame(0);
    let anchor = c.capture_cursor_anchor().unwrap();
    assert_eq!(anchor.id, 42);
    assert_eq!(anchor.row, 2);

    // Keep every even item: w042 moves to index 21.
    c.source()
        .set_filter(|w: &String| w[1..].parse::<usize>().is_ok_and(|n| n % 2 == 0));
    assert_eq!(c.source().index_of(&42), Some(21));

    let source_index: Vec<Option<usize>> =
        (0..100u64).map(|id| c.source().index_of(&id)).collect();
    assert!(c.refresh_anchored(&anchor, |id| source_index[*id as usize]));
    let s = c.state();
    assert_eq!(s.cursor_index, 21);
    assert_eq!(s.cursor_viewport_index, 2);
    assert_eq!(c.current_item().map(|d| d.id), Some(42));

    // The anchored item filtered away: the cursor stays clamped where refresh put it.
    let anchor = c.capture_cursor_anchor().unwrap();
    c.source().set_filter(|w: &String| w.as_str() < "w010");
    assert!(!c.refresh_anchored(&anchor, |_| None));
    assert_eq!(c.view().total(), 10);
    assert!(c.state().cursor_index < 10);
}

#[test]
fn shared_list_serves_concurrent_navigation_and_rendering() {
    let list = SharedList::new(config(), Arc::new(words(1_000)), plain).unwrap();
    std::thread::scope(|scope| {
        for t in 0..4 {
            let list = &list;
            scope.spawn(move || {
                for i in 0..500 {
                    let _ = match (t + i) % 5 {
                        0 | 1 => list.move_down(),
                        2 => list.move_up(),
                        3 => list.page_down(),
                        _ => list.jump_to_index(i * 7),
                    };
                }
            });
        }
        scope.spawn(|| {
            for now in 0..200 {
                let frame = list.render(now);
                assert_eq!(frame.len(), 5);
            }
        });
    });

    let s = list.state();
    assert!(s.cursor_viewport_index < list.height());
    assert_eq!(s.viewport_start + s.cursor_viewport_index, s.cursor_index);
    assert!(list.with_cache(|c| c.len()) <= 3);
    let cursor = list.current_item().unwrap();
    assert_eq!(cursor.id, s.cursor_index as u64);
    assert!(list.visible_items().iter().all(|(_, item)| item.is_some()));
}

#[test]
fn shared_list_completes_loads_from_another_thread() {
    let source = Arc::new(words(100).with_deferred(true));
    let list = SharedList::new(config(), Arc::clone(&source), plain).unwrap();
    assert!(list.current_item().is_none());
    assert!(matches!(
        list.take_events().as_slice(),
        [ViewEvent::ChunkPending { .. }]
    ));

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for (request, ticket) in source.take_pending() {
                let items = source.resolve(&request);
                let _ = list.complete_load(ticket, Ok(items));
            }
        });
    });

    assert_eq!(list.current_item().map(|d| d.item), Some(String::from("w000")));
    assert_eq!(
        list.take_events(),
        vec![ViewEvent::ChunkLoaded {
            range: ItemRange::new(0, 20)
        }]
    );

    // Selection is mirrored into the shared cache.
    assert!(list.toggle_selected());
    assert!(list.current_item().is_some_and(|d| d.selected));
    list.select_range(2, 4);
    assert_eq!(list.selected_indices(), vec![0, 2, 3]);
    list.clear_selection();
    assert!(list.selected_ids().is_empty());
}

#[test]
fn shared_list_batches_animation_updates() {
    let list = SharedList::new(config(), Arc::new(words(20)), plain)
        .unwrap()
        .with_animation_config(AnimationConfig::default().with_tick_interval_ms(100));
    let batches = Arc::new(AtomicUsize::new(0));
    {
        let batches = Arc::clone(&batches);
        list.set_on_update(move |_: &[u64]| {
            batches.fetch_add(1, Ordering::SeqCst);
        });
    }
    list.set_animated_formatter(Spinner {
        calls: Arc::new(AtomicUsize::new(0)),
    });

    let _ = list.frame(0);
    assert_eq!(list.next_tick_at(), Some(100));
    let frame = list.frame(100);
    assert_eq!(batches.load(Ordering::SeqCst), 1);
    assert_eq!(frame.rows[0].text, "> / w000");

    list.clear_animated_formatter();
    assert!(!list.is_animation_loop_running());
}

#[test]
fn shared_list_on_update_may_call_back_into_the_list() {
    let list = Arc::new(
        SharedList::new(config(), Arc::new(words(20)), plain)
            .unwrap()
            .with_animation_config(AnimationConfig::default().with_tick_interval_ms(100)),
    );
    let batches = Arc::new(AtomicUsize::new(0));
    let running = Arc::new(AtomicBool::new(false));
    {
        let weak = Arc::downgrade(&list);
        let batches = Arc::clone(&batches);
        let running = Arc::clone(&running);
        list.set_on_update(move |ids: &[u64]| {
            let Some(list) = weak.upgrade() else {
                return;
            };
            running.store(list.is_animation_loop_running(), Ordering::SeqCst);
            let _ = list.next_tick_at();
            let _ = list.render(100);
            batches.fetch_add(ids.len(), Ordering::SeqCst);
        });
    }
    list.set_animated_formatter(Spinner {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let _ = list.frame(0);

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&list);
    std::thread::spawn(move || {
        let _ = tx.send(worker.tick(100).map(|batch| batch.len()));
    });
    let dirty = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("tick returns while its callback uses the list");
    assert_eq!(dirty, Some(5));
    assert_eq!(batches.load(Ordering::SeqCst), 5);
    assert!(running.load(Ordering::SeqCst));

    // `frame` ticks through the same path.
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&list);
    std::thread::spawn(move || {
        let _ = tx.send(worker.frame(200).len());
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(5));
    assert_eq!(batches.load(Ordering::SeqCst), 10);

    list.clear_on_update();
    let _ = list.frame(300);
    assert_eq!(batches.load(Ordering::SeqCst), 10);
}
