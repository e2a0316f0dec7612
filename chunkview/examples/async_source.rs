// Example: a source that answers later, with stale completions discarded.
use std::cell::RefCell;

use chunkview::{
    Data, DataSource, Fetch, ItemRequest, ListView, LoadTicket, Query, SourceError,
    ViewportConfig,
};

#[derive(Default)]
struct Remote {
    inflight: RefCell<Vec<(ItemRequest, LoadTicket)>>,
}

impl Remote {
    fn answer(request: &ItemRequest) -> Vec<Data<String>> {
        let filters = request.query.filters.len();
        (request.start..request.start + request.count)
            .map(|i| Data::new(i as u64, format!("row {i} ({filters} filters)")))
            .collect()
    }
}

impl DataSource for Remote {
    type Item = String;
    type Key = u64;

    fn total(&self) -> usize {
        500
    }

    fn fetch(
        &self,
        request: &ItemRequest,
        ticket: LoadTicket,
    ) -> Result<Fetch<String, u64>, SourceError> {
        self.inflight.borrow_mut().push((request.clone(), ticket));
        Ok(Fetch::Pending)
    }
}

fn main() {
    let config = ViewportConfig::new(6).with_chunk_size(50);
    let mut view = ListView::new(config, Remote::default()).expect("height is not zero");
    println!("after construction: {:?}", view.take_events());

    // The filter changes before the first response arrives.
    let stale = view.source().inflight.borrow_mut().drain(..).collect::<Vec<_>>();
    let _ = view.set_query(Query::default().with_filter("status", "open"));

    for (request, ticket) in stale {
        let outcome = view.complete_load(ticket, Ok(Remote::answer(&request)));
        println!("stale ticket {}: {outcome:?}", ticket.id);
    }
    let fresh = view.source().inflight.borrow_mut().drain(..).collect::<Vec<_>>();
    for (request, ticket) in fresh {
        let outcome = view.complete_load(ticket, Ok(Remote::answer(&request)));
        println!("fresh ticket {}: {outcome:?}", ticket.id);
    }

    for row in view.visible_items() {
        println!("{:>3}: {:?}", row.index, row.item.item().map(|d| &d.item));
    }
    println!("events: {:?}", view.take_events());
}
