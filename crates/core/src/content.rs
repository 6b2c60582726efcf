//! Tunable town content: role-assignment weights, shop/name catalogs, and the
//! numeric knobs that the scheduler and role handlers read rather than hardcode.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyRoleWeights {
    pub homebody: f32,
    pub plaza_shop: f32,
    pub inn_goer: f32,
    pub wanderer: f32,
}

impl DailyRoleWeights {
    pub fn total(&self) -> f32 {
        self.homebody + self.plaza_shop + self.inn_goer + self.wanderer
    }
}

pub struct ShopTemplate {
    pub type_name: &'static str,
    pub name_pool: &'static [&'static str],
    pub open_min: u32,
    pub close_min: u32,
}

pub struct TownConfig {
    pub daily_role_weights: DailyRoleWeights,
    pub shop_templates: Vec<ShopTemplate>,

    pub path_cache_capacity: usize,
    pub path_visit_cap_ground: u32,
    pub path_visit_cap_upstairs: u32,
    pub path_open_set_sort_threshold: usize,

    pub base_path_budget: u32,
    pub path_budget_min: u32,
    pub path_budget_max: u32,
    pub evening_budget_boost: u32,

    pub rain_slowdown_stride: u32,
    pub heavy_rain_slowdown_stride: u32,

    pub guard_patrol_wait_ticks: u32,
    pub guard_rest_shift_ratio: f32,
    pub guard_patrol_radius_small: i32,
    pub guard_patrol_radius_big: i32,
    pub guard_patrol_radius_city: i32,
    pub guard_patrol_gate_plaza_bias: f32,

    pub bandit_event_chance_per_tick: f32,
    pub pet_follow_radius: u32,

    pub corpse_loot_reveal_ticks: u32,

    /// Per-tick active-actor cap (§4.5 step 9): `max(min_active_npcs, floor(#npcs * active_npc_fraction))`.
    pub min_active_npcs: u32,
    pub active_npc_fraction: f32,
    /// Actors farther than this from the player act on only half their scheduled ticks.
    pub distance_throttle_radius: u32,

    pub home_plan_cooldown_min: u32,
    pub home_plan_cooldown_max: u32,

    pub home_depart_min_earliest: u32,
    pub home_depart_min_latest: u32,
}

impl TownConfig {
    pub fn build_default() -> Self {
        Self {
            daily_role_weights: DailyRoleWeights { homebody: 0.45, plaza_shop: 0.25, inn_goer: 0.2, wanderer: 0.1 },
            shop_templates: vec![
                ShopTemplate {
                    type_name: "general",
                    name_pool: &["Corner Goods", "Market Stall", "Dry Goods Shop"],
                    open_min: 8 * 60,
                    close_min: 18 * 60,
                },
                ShopTemplate {
                    type_name: "blacksmith",
                    name_pool: &["Anvil & Ember", "Ironmonger's"],
                    open_min: 7 * 60,
                    close_min: 17 * 60,
                },
                ShopTemplate {
                    type_name: "tavern",
                    name_pool: &["The Tipped Mug", "Weary Traveler"],
                    open_min: 16 * 60,
                    close_min: 2 * 60,
                },
                ShopTemplate {
                    type_name: "inn",
                    name_pool: &["The Sleeping Fox", "Harbor Rest"],
                    open_min: 0,
                    close_min: 0,
                },
            ],

            path_cache_capacity: 200,
            path_visit_cap_ground: 3500,
            path_visit_cap_upstairs: 4000,
            path_open_set_sort_threshold: 16,

            base_path_budget: 24,
            path_budget_min: 4,
            path_budget_max: 48,
            evening_budget_boost: 8,

            rain_slowdown_stride: 1,
            heavy_rain_slowdown_stride: 2,

            guard_patrol_wait_ticks: 6,
            guard_rest_shift_ratio: 0.5,
            guard_patrol_radius_small: 6,
            guard_patrol_radius_big: 8,
            guard_patrol_radius_city: 10,
            guard_patrol_gate_plaza_bias: 0.35,

            bandit_event_chance_per_tick: 0.0015,
            pet_follow_radius: 6,

            corpse_loot_reveal_ticks: 0,

            min_active_npcs: 12,
            active_npc_fraction: 0.6,
            distance_throttle_radius: 24,

            home_plan_cooldown_min: 4,
            home_plan_cooldown_max: 8,

            home_depart_min_earliest: 1080,
            home_depart_min_latest: 1260,
        }
    }
}

impl TownConfig {
    /// Patrol radius tiers by town size, per §4.6.
    pub fn guard_patrol_radius(&self, size: crate::types::TownSize) -> i32 {
        match size {
            crate::types::TownSize::Small => self.guard_patrol_radius_small,
            crate::types::TownSize::Big => self.guard_patrol_radius_big,
            crate::types::TownSize::City => self.guard_patrol_radius_city,
        }
    }
}

impl Default for TownConfig {
    fn default() -> Self {
        Self::build_default()
    }
}
