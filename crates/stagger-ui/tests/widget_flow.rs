//! Full widget flow with simulated scroll and measurement services.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use stagger_foundation::{BatchPhase, ManualScheduler};
use stagger_ui::{StaggeredList, StaggeredListSpec};

/// Reports heights for everything composed but unmeasured, the way a layout
/// pass would. Item values double as their heights.
fn run_layout_pass(list: &StaggeredList<u32, String>) {
    let generation = list.generation();
    loop {
        let pending = list.state().with_columns(|cols| {
            let mut pending = Vec::new();
            for (column, col) in cols.iter().enumerate() {
                for (local, placed) in col.items().iter().enumerate() {
                    if !col.is_measured(local) {
                        pending.push((column, local, *placed.item() as f32));
                    }
                }
            }
            pending
        });
        if pending.is_empty() {
            break;
        }
        for (column, local, height) in pending {
            list.item_measured(generation, column, local, height);
        }
    }
}

#[test]
fn paged_loading_with_measurement_feedback() {
    let scheduler = ManualScheduler::new();
    let list = StaggeredList::builder(StaggeredListSpec::default(), Rc::new(scheduler))
        .render_item(|item: &u32| format!("#{item}"))
        .header("hero".to_string())
        .build()
        .expect("valid widget");

    let pages_loaded = Rc::new(Cell::new(0));
    let p = Rc::clone(&pages_loaded);
    list.state().set_on_load_complete(move || p.set(p.get() + 1));

    let measures = Rc::new(RefCell::new(Vec::new()));
    let m = Rc::clone(&measures);
    list.state()
        .set_on_measure(move |result| m.borrow_mut().push(result.clone()));

    list.header_measured(60.0);
    list.extend([10, 20, 30]);
    run_layout_pass(&list);
    assert_eq!(pages_loaded.get(), 1);

    // the scroll service announces the end of content; the app loads page 2
    let wants_more = Rc::new(Cell::new(false));
    let w = Rc::clone(&wants_more);
    list.state().set_on_end_reached(move |_| w.set(true));
    list.end_reached(8.0);
    assert!(wants_more.get());

    list.extend([40, 50]);
    run_layout_pass(&list);
    assert_eq!(pages_loaded.get(), 2);
    assert_eq!(list.phase(), BatchPhase::Complete);

    let result = list.measure_result();
    assert_eq!(result.header, 60.0);
    assert_eq!(result.columns.iter().sum::<f32>(), 150.0);
    assert!(!measures.borrow().is_empty());
}

#[test]
fn refresh_starts_a_clean_generation() {
    let scheduler = ManualScheduler::new();
    let list = StaggeredList::builder(StaggeredListSpec::default(), Rc::new(scheduler))
        .render_item(|item: &u32| format!("#{item}"))
        .build()
        .expect("valid widget");

    list.extend([100, 200]);
    run_layout_pass(&list);
    let old_generation = list.generation();
    assert_eq!(list.column_height(0) + list.column_height(1), 300.0);

    list.refresh_requested();
    assert_eq!(list.phase(), BatchPhase::Idle);
    assert_ne!(list.generation(), old_generation);

    list.extend([5, 5]);
    run_layout_pass(&list);

    // a straggling layout callback from before the refresh is ignored
    list.item_measured(old_generation, 0, 0, 100.0);
    assert_eq!(list.column_height(0) + list.column_height(1), 10.0);
}
