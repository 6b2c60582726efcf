//! Deterministic town construction for tests and the `tools` CLI. This is
//! not a production map-generation feature: it carves a handful of fixed
//! rectangular buildings around a plaza, in the spirit of the teacher's
//! room-carving helpers, so role/scheduler tests have a small but complete
//! town to run against.

use crate::content::TownConfig;
use crate::state::{
    Actor, Building, CombatStats, GuardState, HomePlanState, HomeRef, Map, PatrolState, Prop, PropKind, Shop,
    ShopKind, TownState,
};
use crate::types::{ActorFloor, ActorKind, ActorState, GuardRestRole, Pos, Rect, TileKind, TownSize};

/// Static per-`ActorKind` stride (§4.5's stride table): pets move every
/// third tick, shopkeepers every other tick outside their arrive-to-leave
/// window, everyone else every tick.
fn base_stride_for(kind: ActorKind) -> u32 {
    match kind {
        ActorKind::Pet => 3,
        ActorKind::Shopkeeper => 2,
        _ => 1,
    }
}

fn carve_room(map: &mut Map, rect: Rect, door: Pos) {
    for y in rect.y..rect.y + rect.h {
        for x in rect.x..rect.x + rect.w {
            let pos = Pos::new(y, x);
            let on_perimeter = y == rect.y || y == rect.y + rect.h - 1 || x == rect.x || x == rect.x + rect.w - 1;
            map.set_tile(pos, if on_perimeter { TileKind::Wall } else { TileKind::Floor });
        }
    }
    map.set_tile(door, TileKind::Door);
}

/// A bare town with an open floor everywhere, no buildings, and no actors.
/// Useful for unit tests that only need walkability and a place to put
/// corpses/props.
pub fn empty_town(width: usize, height: usize) -> TownState {
    let mut map = Map::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            map.set_tile(Pos::new(y, x), TileKind::Floor);
        }
    }
    TownState {
        map,
        buildings: Vec::new(),
        shops: Vec::new(),
        props: Vec::new(),
        inn_upstairs: None,
        inn_stairs_ground: Vec::new(),
        plaza: Rect { x: 0, y: 0, w: width as i32, h: height as i32 },
        exit_gate: Pos::new(0, 0),
        town_size: TownSize::Small,
        max_active_npcs: None,
        path_budget_override: None,
        player_pos: None,
        actors: slotmap::SlotMap::default(),
        corpses: Vec::new(),
        bandit_event_active: false,
    }
}

fn base_actor(kind: ActorKind, pos: Pos) -> Actor {
    Actor {
        id: Default::default(),
        kind,
        is_follower: false,
        pos,
        last_pos: pos,
        floor: ActorFloor::Ground,
        home: None,
        work_target: None,
        work_inside: false,
        shop_ref: None,
        bound_to_building: None,
        plan: Vec::new(),
        plan_goal: None,
        full_plan: Vec::new(),
        full_plan_goal: None,
        home_plan: HomePlanState::default(),
        state: ActorState::Roaming,
        sleeping: false,
        depart_assigned_for_day: false,
        home_depart_min: 0,
        go_inn_today: false,
        inn_pre_home_done: false,
        likes_inn: false,
        likes_tavern: false,
        daily_role: None,
        inn_seat: None,
        bench_seat: None,
        home_sit: None,
        errand_stay_turns: 0,
        patrol: PatrolState { goal: None, stay_turns: 0 },
        guard: None,
        near_stairs_count: 0,
        stride: base_stride_for(kind),
        stride_offset: 0,
        combat: CombatStats { hp: 10, max_hp: 10, atk: 1, level: 1, damage_scale: 1.0 },
        dead: false,
    }
}

/// A small, fully wired town: a plaza, a house, a general shop, an inn, and
/// one actor of every kind. Deterministic in everything except actor
/// insertion order, which the scheduler shuffles anyway.
pub fn small_test_town(seed: u64) -> TownState {
    let width = 40;
    let height = 30;
    let mut map = Map::new(width, height);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            map.set_tile(Pos::new(y, x), TileKind::Road);
        }
    }

    let house = Rect { x: 2, y: 2, w: 6, h: 5 };
    let house_door = Pos::new(6, 4);
    carve_room(&mut map, house, house_door);

    let shop_building = Rect { x: 12, y: 2, w: 6, h: 5 };
    let shop_door = Pos::new(6, 14);
    carve_room(&mut map, shop_building, shop_door);

    let inn_building = Rect { x: 22, y: 2, w: 8, h: 6 };
    let inn_door = Pos::new(7, 24);
    carve_room(&mut map, inn_building, inn_door);

    let barracks = Rect { x: 32, y: 2, w: 5, h: 4 };
    let barracks_door = Pos::new(2, 34);
    carve_room(&mut map, barracks, barracks_door);
    let barracks_bed = Pos::new(barracks.y + 2, barracks.x + 2);

    let plaza = Rect { x: 10, y: 12, w: 16, h: 10 };
    for y in plaza.y..plaza.y + plaza.h {
        for x in plaza.x..plaza.x + plaza.w {
            map.set_tile(Pos::new(y, x), TileKind::Floor);
        }
    }

    let buildings = vec![
        Building { rect: house, door: house_door, prefab_id: None, tags: vec!["house".into()] },
        Building { rect: shop_building, door: shop_door, prefab_id: None, tags: vec!["shop".into()] },
        Building { rect: inn_building, door: inn_door, prefab_id: None, tags: vec!["inn".into()] },
        Building { rect: barracks, door: barracks_door, prefab_id: None, tags: vec!["barracks".into()] },
    ];

    let shops = vec![
        Shop {
            x: shop_door.x,
            y: shop_door.y,
            kind: ShopKind::Standard,
            type_name: "general".into(),
            name: "Corner Goods".into(),
            open_min: 8 * 60,
            close_min: 18 * 60,
            always_open: false,
            building: 1,
            inside: Pos::new(shop_building.y + 2, shop_building.x + 3),
        },
        Shop {
            x: inn_door.x,
            y: inn_door.y,
            kind: ShopKind::Inn,
            type_name: "inn".into(),
            name: "The Sleeping Fox".into(),
            open_min: 0,
            close_min: 0,
            always_open: true,
            building: 2,
            inside: Pos::new(inn_building.y + 2, inn_building.x + 3),
        },
    ];

    let props = vec![
        Prop { x: shop_building.x + 2, y: shop_building.y + 1, kind: PropKind::Counter, name: None },
        Prop { x: barracks_bed.x, y: barracks_bed.y, kind: PropKind::Bed, name: None },
    ];

    let mut actors = slotmap::SlotMap::default();

    let mut resident = base_actor(ActorKind::Resident, house_door);
    resident.home = Some(HomeRef { building: 0, x: house.x + 2, y: house.y + 2, door: house_door, bed: Some(Pos::new(house.y + 2, house.x + 2)) });
    let resident_id = actors.insert_with_key(|id| {
        let mut r = resident;
        r.id = id;
        r
    });

    let mut shopkeeper = base_actor(ActorKind::Shopkeeper, shop_door);
    shopkeeper.home = Some(HomeRef { building: 0, x: house.x + 2, y: house.y + 2, door: house_door, bed: None });
    shopkeeper.shop_ref = Some(0);
    actors.insert_with_key(|id| {
        let mut s = shopkeeper;
        s.id = id;
        s
    });

    let guard_post = Pos::new(plaza.y, plaza.x);
    let mut guard = base_actor(ActorKind::Guard, guard_post);
    guard.guard = Some(GuardState { post: guard_post, patrol_goal: None, patrol_wait: 0, rest_role: GuardRestRole::Duty });
    guard.home =
        Some(HomeRef { building: 3, x: barracks.x + 2, y: barracks.y + 2, door: barracks_door, bed: Some(barracks_bed) });
    actors.insert_with_key(|id| {
        let mut g = guard;
        g.id = id;
        g
    });

    let mut bandit = base_actor(ActorKind::Bandit, Pos::new(height as i32 - 3, width as i32 - 3));
    bandit.combat = CombatStats { hp: 6, max_hp: 6, atk: 2, level: 1, damage_scale: 1.0 };
    actors.insert_with_key(|id| {
        let mut b = bandit;
        b.id = id;
        b
    });

    let _ = resident_id;
    let mut pet = base_actor(ActorKind::Pet, house_door);
    pet.is_follower = true;
    actors.insert_with_key(|id| {
        let mut p = pet;
        p.id = id;
        p
    });

    let mut cleaner = base_actor(ActorKind::CorpseCleaner, Pos::new(plaza.y + 1, plaza.x + 1));
    actors.insert_with_key(|id| {
        let mut c = cleaner;
        c.id = id;
        c
    });

    let _ = seed;
    TownState {
        map,
        buildings,
        shops,
        props,
        inn_upstairs: None,
        inn_stairs_ground: Vec::new(),
        plaza,
        exit_gate: Pos::new(0, 0),
        town_size: TownSize::Small,
        max_active_npcs: None,
        path_budget_override: None,
        player_pos: None,
        actors,
        corpses: Vec::new(),
        bandit_event_active: false,
    }
}

pub fn default_config() -> TownConfig {
    TownConfig::build_default()
}
