// Play-field geometry, in world units. Actor positions are centres.
pub(crate) const FIELD_W: f32 = 360.0;
pub(crate) const FIELD_H: f32 = 580.0;
pub(crate) const GROUND_Y: f32 = FIELD_H / 2.0 + 60.0;
pub(crate) const FLOOR_Y: f32 = FIELD_H - 128.0;
pub(crate) const PLACE_LIMIT_Y: f32 = 412.0;

pub(crate) const PET_SIZE: f32 = 64.0;
pub(crate) const ITEM_SIZE: f32 = 36.0;
pub(crate) const WASTE_SIZE: f32 = 32.0;
pub(crate) const BIN_SIZE: f32 = 48.0;
pub(crate) const SLOT_SIZE: f32 = 44.0;
const BIN_X: f32 = 84.0;

pub(crate) const STAT_MIN: f32 = 0.0;
pub(crate) const STAT_MAX: f32 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec2 {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Vec2 {
    pub(crate) const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// Axis-aligned box around a centre point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl Rect {
    pub(crate) fn centered(c: Vec2, size: f32) -> Self {
        let h = size / 2.0;
        Self {
            min: Vec2::new(c.x - h, c.y - h),
            max: Vec2::new(c.x + h, c.y + h),
        }
    }

    pub(crate) fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub(crate) fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Resting centre height for an actor of the given size.
pub(crate) fn rest_y(size: f32) -> f32 {
    FLOOR_Y - size / 2.0
}

/// Where the waste bin stands, for both drawing and collision.
pub(crate) fn bin_pos() -> Vec2 {
    Vec2::new(BIN_X, rest_y(BIN_SIZE))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatKind {
    Health,
    Fun,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Stats {
    pub(crate) health: f32,
    pub(crate) fun: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: STAT_MAX,
            fun: STAT_MAX,
        }
    }
}

impl Stats {
    pub(crate) fn get(&self, stat: StatKind) -> f32 {
        match stat {
            StatKind::Health => self.health,
            StatKind::Fun => self.fun,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DecayRates {
    pub(crate) health: f32,
    pub(crate) fun: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            health: 0.1,
            fun: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ItemKind {
    Good,
    Bad,
}

impl ItemKind {
    pub(crate) fn ascii(self) -> &'static str {
        match self {
            ItemKind::Good => "()",
            ItemKind::Bad => "[]",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Item {
    pub(crate) kind: ItemKind,
    pub(crate) glyph: &'static str,
}

const fn good(glyph: &'static str) -> Item {
    Item {
        kind: ItemKind::Good,
        glyph,
    }
}

const fn bad(glyph: &'static str) -> Item {
    Item {
        kind: ItemKind::Bad,
        glyph,
    }
}

pub(crate) const ITEM_POOL: &[Item] = &[
    good("🧀"),
    good("🥖"),
    good("🥐"),
    good("🥙"),
    good("🥗"),
    good("🌮"),
    good("🥪"),
    good("🍱"),
    good("🍠"),
    good("🍣"),
    good("🍲"),
    good("🍝"),
    good("🥣"),
    good("🥝"),
    good("🍇"),
    good("🍈"),
    good("🍉"),
    good("🍊"),
    good("🍋"),
    good("🍌"),
    good("🍍"),
    good("🍎"),
    good("🍏"),
    good("🍒"),
    good("🍑"),
    good("🍐"),
    good("🍓"),
    good("🍅"),
    good("🍆"),
    good("🌽"),
    good("🥒"),
    good("🥑"),
    good("🥦"),
    good("🥕"),
    bad("🥨"),
    bad("🥞"),
    bad("🍟"),
    bad("🌭"),
    bad("🍔"),
    bad("🍕"),
    bad("🍿"),
    bad("🍖"),
    bad("🍗"),
    bad("🥩"),
    bad("🥡"),
    bad("🥠"),
    bad("🥟"),
    bad("🍧"),
    bad("🍦"),
    bad("🥧"),
    bad("🍨"),
    bad("🍩"),
    bad("🍪"),
    bad("🎂"),
    bad("🍭"),
    bad("🍬"),
    bad("🍫"),
    bad("🍰"),
    bad("🍮"),
    bad("🍡"),
];

/// Contents of the four slots at the start of a game.
pub(crate) const STARTER_ITEMS: [Item; 4] = [good("🥗"), good("🥪"), bad("🍔"), bad("🍦")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Facing {
    East,
    West,
}

impl Facing {
    pub(crate) fn sign(self) -> f32 {
        match self {
            Facing::East => 1.0,
            Facing::West => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Face {
    Ecstatic,
    Grinning,
    Content,
    Gloomy,
    Feverish,
    Startled,
    Hugging,
    Gaping,
    Savoring,
    Straining,
    Nauseous,
    Vomiting,
    Dejected,
    Dead,
}

impl Face {
    /// Resting expression derived from whichever stat is lower.
    pub(crate) fn from_stats(stats: &Stats) -> Face {
        if stats.fun < stats.health {
            if stats.fun > 90.0 {
                Face::Ecstatic
            } else if stats.fun > 50.0 {
                Face::Content
            } else {
                Face::Gloomy
            }
        } else if stats.health > 90.0 {
            Face::Grinning
        } else if stats.health > 50.0 {
            Face::Content
        } else {
            Face::Feverish
        }
    }

    pub(crate) fn emoji(self) -> &'static str {
        match self {
            Face::Ecstatic => "🤩",
            Face::Grinning => "😁",
            Face::Content => "🙂",
            Face::Gloomy => "😔",
            Face::Feverish => "🤒",
            Face::Startled => "😲",
            Face::Hugging => "🤗",
            Face::Gaping => "😮",
            Face::Savoring => "😌",
            Face::Straining => "😣",
            Face::Nauseous => "🤢",
            Face::Vomiting => "🤮",
            Face::Dejected => "😞",
            Face::Dead => "💀",
        }
    }

    pub(crate) fn ascii(self) -> &'static str {
        match self {
            Face::Ecstatic => "*D",
            Face::Grinning => ":D",
            Face::Content => ":)",
            Face::Gloomy => ":(",
            Face::Feverish => ":~",
            Face::Startled => ":O",
            Face::Hugging => "^^",
            Face::Gaping => ":o",
            Face::Savoring => "-)",
            Face::Straining => ">_",
            Face::Nauseous => ":S",
            Face::Vomiting => ":P",
            Face::Dejected => ";(",
            Face::Dead => "xx",
        }
    }
}

/// Gameplay constants. Fixed for a session; times are in milliseconds.
#[derive(Clone, Debug)]
pub(crate) struct Rules {
    pub(crate) decay: DecayRates,
    pub(crate) decay_interval_ms: u64,
    pub(crate) waste_interval_ms: u64,
    pub(crate) dispatch_interval_ms: u64,
    pub(crate) cycle_interval_ms: u64,
    pub(crate) ground_check_ms: u64,
    pub(crate) game_over_delay_ms: u64,
    pub(crate) feed_gain: f32,
    pub(crate) streak_bonus: f32,
    pub(crate) sick_penalty: f32,
    pub(crate) streak_threshold: usize,
    pub(crate) last_eaten_capacity: usize,
    pub(crate) gravity: f32, // units / s^2
    pub(crate) waste_on_start: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            decay: DecayRates::default(),
            decay_interval_ms: 1000,
            waste_interval_ms: 30_000,
            dispatch_interval_ms: 500,
            cycle_interval_ms: 200,
            ground_check_ms: 1500,
            game_over_delay_ms: 3000,
            feed_gain: 10.0,
            streak_bonus: 15.0,
            sick_penalty: 15.0,
            streak_threshold: 3,
            last_eaten_capacity: 5,
            gravity: 300.0,
            waste_on_start: true,
        }
    }
}
