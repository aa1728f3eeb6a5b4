//! Short, distinct English words for passphrases.

pub(crate) const WORDS: &[&str] = &[
    "able", "acid", "aged", "also", "area", "army", "away", "baby", "back", "bald", "band",
    "bank", "barn", "base", "bath", "beam", "bean", "bear", "beat", "bell", "belt", "bend",
    "best", "bird", "bite", "blue", "boat", "body", "bold", "bolt", "bone", "book", "boot",
    "born", "boss", "bowl", "bulk", "burn", "bush", "busy", "cake", "calm", "camp", "card",
    "care", "cart", "case", "cash", "cast", "cave", "chef", "chin", "chip", "city", "clay",
    "clip", "club", "coal", "coat", "code", "coin", "cold", "cone", "cook", "cool", "cord",
    "corn", "cost", "crab", "crew", "crop", "crow", "cube", "curl", "dark", "dawn", "deal",
    "deer", "desk", "dial", "dice", "dirt", "dish", "dock", "dome", "door", "dose", "dove",
    "draw", "drum", "duck", "dune", "dusk", "dust", "easy", "echo", "edge", "epic", "exit",
    "face", "fact", "fair", "farm", "fast", "fern", "film", "fire", "fish", "flag", "flat",
    "flip", "foam", "fold", "folk", "food", "foot", "fork", "form", "fort", "fox", "frog",
    "fuel", "game", "gate", "gear", "gift", "glad", "glow", "goat", "gold", "golf", "good",
    "gown", "grab", "gray", "grid", "grip", "gulf", "hail", "half", "hall", "hand", "harp",
    "hawk", "heat", "herb", "hero", "hill", "hint", "hive", "hold", "hole", "home", "hook",
    "horn", "host", "hour", "huge", "hunt", "idea", "inch", "iron", "isle", "jade", "jazz",
    "jeep", "join", "joke", "jump", "jury", "keen", "kelp", "kept", "kick", "kind", "king",
    "kite", "knee", "knot", "lace", "lake", "lamb", "lamp", "land", "lane", "lark", "lava",
    "lawn", "leaf", "lens", "lift", "lily", "lime", "line", "lion", "list", "loaf", "lock",
    "loft", "loud", "luck", "lung", "mail", "malt", "mane", "mango", "map", "mare", "mask",
    "math", "maze", "meal", "melt", "mild", "milk", "mint", "mist", "moat", "mole", "moon",
    "moss", "moth", "mule", "nail", "neat", "nest", "news", "nose", "note", "oak", "oath",
    "oats", "open", "oval", "oven", "palm", "park", "path", "peak", "pear", "pine", "pink",
    "plum", "poem", "pond", "pony", "pool", "port", "quad", "quay", "quiz", "raft", "rail",
    "rain", "ramp", "reed", "reef", "rice", "ring", "road", "robe", "rock", "roof", "rope",
    "rose", "ruby", "rust", "safe", "sage", "sail", "salt", "sand", "seal", "seed", "shed",
    "ship", "shoe", "silk", "sing", "slab", "snow", "soap", "sock", "soft", "soil", "song",
    "soup", "star", "stem", "surf", "swan", "tail", "tank", "tape", "team", "tent", "tide",
    "tile", "toad", "tool", "tree", "tube", "tuna", "twig", "vase", "veil", "vine", "wave",
];
