//! Seed scenarios pinning strategy behaviour.
//!
//! These guard the historical regression where the requested strategy was
//! silently ignored: each scenario asserts that different strategies lead
//! to observably different recommendations (truck choice, truck count, or
//! objective profile).

use fleetpack::{
    ContainerSlot, ContainerSnapshot, ItemSnapshot, PackEngine, PackOptions, PackRequest,
    PackStrategy, RouteDescriptor, RouteType, TruckCategory,
};

fn make_container(
    id: &str,
    l: f64,
    w: f64,
    h: f64,
    payload: f64,
    category: TruckCategory,
) -> ContainerSnapshot {
    ContainerSnapshot {
        id: id.into(),
        name: id.into(),
        length_cm: l,
        width_cm: w,
        height_cm: h,
        max_payload_kg: payload,
        category,
        cost_per_km: None,
        fuel_per_km: None,
        driver_cost_per_day: None,
        maintenance_per_km: None,
        age_factor: None,
        depreciation_per_km: None,
    }
}

/// Zero out everything but the flat per-km rate so trip costs are exact.
fn with_flat_rate(mut c: ContainerSnapshot, rate: f64) -> ContainerSnapshot {
    c.cost_per_km = Some(rate);
    c.fuel_per_km = Some(0.0);
    c.maintenance_per_km = Some(0.0);
    c.depreciation_per_km = Some(0.0);
    c.driver_cost_per_day = Some(0.0);
    c
}

fn make_item(id: &str, l: f64, w: f64, h: f64, weight: f64) -> ItemSnapshot {
    ItemSnapshot {
        id: id.into(),
        name: id.into(),
        length_cm: l,
        width_cm: w,
        height_cm: h,
        weight_kg: weight,
        can_rotate: true,
        fragile: false,
        stackable: true,
        max_stack_height: None,
        priority: 0,
        value: 0.0,
    }
}

fn request(
    items: Vec<(ItemSnapshot, u32)>,
    containers: Vec<ContainerSlot>,
    strategy: PackStrategy,
    route: RouteDescriptor,
) -> PackRequest {
    PackRequest {
        items,
        containers,
        strategy,
        route,
        max_combos: None,
        deadline: None,
        options: PackOptions::default(),
    }
}

fn small_and_large_slots() -> Vec<ContainerSlot> {
    vec![
        ContainerSlot::bounded(
            make_container("T-SMALL", 220.0, 150.0, 120.0, 750.0, TruckCategory::Light),
            2,
        ),
        ContainerSlot::bounded(
            make_container("T-LARGE", 960.0, 240.0, 240.0, 25_000.0, TruckCategory::Heavy),
            2,
        ),
    ]
}

#[test]
fn ten_cartons_space_and_cost_both_take_the_small_truck() {
    let engine = PackEngine::with_defaults().unwrap();
    let route = RouteDescriptor::new(250.0, RouteType::Highway);
    let item = make_item("CRT", 80.0, 60.0, 40.0, 30.0);

    for strategy in [PackStrategy::Space, PackStrategy::Cost] {
        let response = engine
            .pack(&request(
                vec![(item.clone(), 10)],
                small_and_large_slots(),
                strategy,
                route.clone(),
            ))
            .unwrap();
        let plan = response.recommendation.unwrap();
        assert!(plan.fits_all(), "{strategy}: all ten cartons must fit");
        assert_eq!(plan.metrics.truck_count, 1, "{strategy}: one truck suffices");
        assert_eq!(
            plan.containers[0].container.id, "T-SMALL",
            "{strategy}: the small truck wins"
        );
    }
}

#[test]
fn fifty_cartons_space_takes_the_single_large_truck() {
    let engine = PackEngine::with_defaults().unwrap();
    let route = RouteDescriptor::new(250.0, RouteType::Highway);
    let item = make_item("CRT", 80.0, 60.0, 40.0, 30.0);

    let response = engine
        .pack(&request(
            vec![(item, 50)],
            small_and_large_slots(),
            PackStrategy::Space,
            route,
        ))
        .unwrap();
    let plan = response.recommendation.unwrap();
    assert!(plan.fits_all());
    assert_eq!(plan.metrics.truck_count, 1);
    assert_eq!(plan.containers[0].container.id, "T-LARGE");
}

#[test]
fn cost_and_min_trucks_diverge_on_cheap_pairs() {
    // A pair of cheap column trucks versus one pricier big truck. Cost
    // must take the pair, MinTrucks the single big truck — the historical
    // strategy-ignored regression made these collapse into one answer.
    let engine = PackEngine::with_defaults().unwrap();
    let route = RouteDescriptor::new(100.0, RouteType::City);
    let small = with_flat_rate(
        make_container("T-CHEAP", 100.0, 100.0, 200.0, 10_000.0, TruckCategory::Light),
        1.0,
    );
    let big = with_flat_rate(
        make_container("T-BIG", 400.0, 200.0, 200.0, 18_000.0, TruckCategory::Heavy),
        11.0,
    );
    let mut item = make_item("BOX", 100.0, 100.0, 100.0, 10.0);
    item.can_rotate = false;

    let slots = vec![
        ContainerSlot::bounded(small, 2),
        ContainerSlot::bounded(big, 1),
    ];

    let cost_plan = engine
        .pack(&request(
            vec![(item.clone(), 4)],
            slots.clone(),
            PackStrategy::Cost,
            route.clone(),
        ))
        .unwrap()
        .recommendation
        .unwrap();
    let min_trucks_plan = engine
        .pack(&request(vec![(item, 4)], slots, PackStrategy::MinTrucks, route))
        .unwrap()
        .recommendation
        .unwrap();

    assert_eq!(cost_plan.metrics.truck_count, 2, "Cost picks the cheap pair");
    assert!((cost_plan.metrics.total_cost - 200.0).abs() < 1e-6);
    assert_eq!(
        min_trucks_plan.metrics.truck_count, 1,
        "MinTrucks picks the single big truck"
    );
    assert!((min_trucks_plan.metrics.total_cost - 1_100.0).abs() < 1e-6);
    assert_ne!(
        (cost_plan.metrics.truck_count, cost_plan.metrics.total_cost.to_bits()),
        (
            min_trucks_plan.metrics.truck_count,
            min_trucks_plan.metrics.total_cost.to_bits()
        ),
        "strategies must produce distinguishable profiles"
    );
}

#[test]
fn sixty_cartons_min_trucks_takes_one_big_truck() {
    // Fleet sizing: 60 cartons, a mid truck at 1000 per 250 km and a big
    // truck at 1400 per 250 km.
    let engine = PackEngine::with_defaults().unwrap();
    let route = RouteDescriptor::new(250.0, RouteType::City);
    let mid = with_flat_rate(
        make_container("T-MID", 430.0, 200.0, 190.0, 10_000.0, TruckCategory::Medium),
        4.0,
    );
    let big = with_flat_rate(
        make_container("T-BIG", 700.0, 240.0, 240.0, 18_000.0, TruckCategory::Heavy),
        5.6,
    );
    let item = make_item("CRT", 100.0, 80.0, 80.0, 30.0);
    let slots = vec![
        ContainerSlot::bounded(mid, 4),
        ContainerSlot::bounded(big, 2),
    ];

    let min_trucks_plan = engine
        .pack(&request(
            vec![(item.clone(), 60)],
            slots.clone(),
            PackStrategy::MinTrucks,
            route.clone(),
        ))
        .unwrap()
        .recommendation
        .unwrap();
    assert!(min_trucks_plan.fits_all());
    assert_eq!(min_trucks_plan.metrics.truck_count, 1);
    assert_eq!(min_trucks_plan.containers[0].container.id, "T-BIG");
    assert!((min_trucks_plan.metrics.total_cost - 1_400.0).abs() < 1e-6);

    let cost_plan = engine
        .pack(&request(vec![(item, 60)], slots, PackStrategy::Cost, route))
        .unwrap()
        .recommendation
        .unwrap();
    assert!(cost_plan.fits_all());
    // The big truck is also the cheapest way to move all sixty cartons.
    assert!(cost_plan.metrics.total_cost <= min_trucks_plan.metrics.total_cost + 1e-6);
    // Strategies remain distinguishable through their objectives.
    assert_ne!(
        min_trucks_plan.metrics.objective.to_bits(),
        cost_plan.metrics.objective.to_bits()
    );
}

#[test]
fn fragile_cartons_never_stack_through_the_full_pipeline() {
    let engine = PackEngine::with_defaults().unwrap();
    let mut fragile = make_item("FRG", 100.0, 100.0, 100.0, 100.0);
    fragile.fragile = true;
    fragile.can_rotate = false;
    let truck = make_container("T-BOXY", 300.0, 200.0, 200.0, 10_000.0, TruckCategory::Medium);

    let response = engine
        .pack(&request(
            vec![(fragile, 2)],
            vec![ContainerSlot::bounded(truck, 1)],
            PackStrategy::Space,
            RouteDescriptor::new(50.0, RouteType::City),
        ))
        .unwrap();
    let plan = response.recommendation.unwrap();
    assert!(plan.fits_all());
    let packing = &plan.containers[0].packing;
    for p in &packing.placements {
        assert!(p.y.abs() < 1e-6, "fragile carton must stay on the floor");
    }
    assert!((packing.volume_utilization - 2_000_000.0 / 12_000_000.0).abs() < 1e-4);
}
