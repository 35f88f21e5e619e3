//! Static keyword rule table.
//!
//! The vocabulary is domain configuration, not engine logic: Portuguese and
//! English terms collected from field photos of e-waste drop-offs. Matching
//! is case-insensitive substring containment over the detector label, so
//! multi-word keywords ("smart tv", "light bulb") stay matchable against
//! free-form labels and captions.

use weee_types::WeeeCategory;

/// One keyword rule: any label containing `keyword` maps to `category`
/// with the given scoring weight.
#[derive(Debug, Clone, Copy)]
pub struct RuleEntry {
    pub keyword: &'static str,
    pub category: WeeeCategory,
    pub weight: f64,
}

const fn rule(keyword: &'static str, category: WeeeCategory, weight: f64) -> RuleEntry {
    RuleEntry {
        keyword,
        category,
        weight,
    }
}

use WeeeCategory::*;

/// The full rule table. Keywords are stored lowercase; `map_label`
/// lowercases input before matching.
///
/// Weights below 1.0 mark terms that are real evidence but not decisive on
/// their own (generic words, parts shared across device families).
pub const RULES: &[RuleEntry] = &[
    // 1 - Temperature exchange equipment
    rule("refrigerador", TemperatureExchange, 1.0),
    rule("refrigerator", TemperatureExchange, 1.0),
    rule("geladeira", TemperatureExchange, 1.0),
    rule("frigorífico", TemperatureExchange, 1.0),
    rule("freezer", TemperatureExchange, 1.0),
    rule("congelador", TemperatureExchange, 1.0),
    rule("ar condicionado", TemperatureExchange, 1.0),
    rule("ar-condicionado", TemperatureExchange, 1.0),
    rule("air conditioner", TemperatureExchange, 1.0),
    rule("heat pump", TemperatureExchange, 1.0),
    rule("bomba de calor", TemperatureExchange, 1.0),
    rule("fridge", TemperatureExchange, 1.0),
    rule("cooler", TemperatureExchange, 0.8),
    // 2 - Screens and monitors
    rule("televisor", ScreensMonitors, 1.0),
    rule("television", ScreensMonitors, 1.0),
    rule("smart tv", ScreensMonitors, 1.0),
    rule("tv", ScreensMonitors, 0.8),
    rule("monitor", ScreensMonitors, 1.0),
    rule("ecrã", ScreensMonitors, 1.0),
    rule("tela", ScreensMonitors, 0.8),
    rule("display", ScreensMonitors, 0.8),
    rule("screen", ScreensMonitors, 0.8),
    // Cross-listed in the source vocabulary under screens and small IT;
    // screens wins its preference order, at reduced weight.
    rule("laptop", ScreensMonitors, 0.8),
    rule("notebook", ScreensMonitors, 0.8),
    rule("tablet", ScreensMonitors, 0.8),
    // 3 - Lamps
    rule("lâmpada", Lamps, 1.0),
    rule("lampada", Lamps, 1.0),
    rule("lamp", Lamps, 1.0),
    rule("light bulb", Lamps, 1.0),
    rule("bulb", Lamps, 1.0),
    rule("bulbo", Lamps, 1.0),
    rule("fluorescente", Lamps, 1.0),
    rule("fluorescent", Lamps, 1.0),
    rule("incandescente", Lamps, 1.0),
    rule("incandescent", Lamps, 1.0),
    rule("led", Lamps, 0.5),
    rule("tubo", Lamps, 0.5),
    // 4 - Large equipment
    rule("máquina de lavar", LargeEquipment, 1.0),
    rule("washing machine", LargeEquipment, 1.0),
    rule("lavadora", LargeEquipment, 1.0),
    rule("secadora", LargeEquipment, 1.0),
    rule("dryer", LargeEquipment, 1.0),
    rule("lava-louças", LargeEquipment, 1.0),
    rule("lava louças", LargeEquipment, 1.0),
    rule("dishwasher", LargeEquipment, 1.0),
    rule("stove", LargeEquipment, 1.0),
    rule("fogão", LargeEquipment, 1.0),
    rule("oven", LargeEquipment, 1.0),
    rule("forno", LargeEquipment, 1.0),
    // 5 - Small equipment
    rule("aspirador", SmallEquipment, 1.0),
    rule("vacuum", SmallEquipment, 1.0),
    rule("micro-ondas", SmallEquipment, 1.0),
    rule("microondas", SmallEquipment, 1.0),
    rule("microwave", SmallEquipment, 1.0),
    rule("torradeira", SmallEquipment, 1.0),
    rule("toaster", SmallEquipment, 1.0),
    rule("ferro de passar", SmallEquipment, 1.0),
    rule("kettle", SmallEquipment, 1.0),
    rule("chaleira", SmallEquipment, 1.0),
    rule("liquidificador", SmallEquipment, 1.0),
    rule("blender", SmallEquipment, 1.0),
    rule("mixer", SmallEquipment, 1.0),
    rule("câmera", SmallEquipment, 1.0),
    rule("camera", SmallEquipment, 1.0),
    rule("headphone", SmallEquipment, 1.0),
    rule("speaker", SmallEquipment, 0.8),
    rule("keyboard", SmallEquipment, 0.8),
    rule("teclado", SmallEquipment, 0.8),
    rule("mouse", SmallEquipment, 0.8),
    rule("cable", SmallEquipment, 1.0),
    rule("cabo", SmallEquipment, 1.0),
    rule("wire", SmallEquipment, 0.6),
    rule("fio", SmallEquipment, 0.6),
    // 6 - Small IT and telecommunication equipment
    rule("celular", SmallIt, 1.0),
    rule("telefone", SmallIt, 1.0),
    rule("smartphone", SmallIt, 1.0),
    rule("phone", SmallIt, 1.0),
    rule("mini pc", SmallIt, 1.0),
    rule("router", SmallIt, 1.0),
    rule("roteador", SmallIt, 1.0),
    rule("modem", SmallIt, 1.0),
    rule("gps", SmallIt, 1.0),
    rule("calculadora", SmallIt, 1.0),
    rule("calculator", SmallIt, 1.0),
    rule("printer", SmallIt, 1.0),
    rule("impressora", SmallIt, 1.0),
];

/// Terms that indicate a photo is clearly not e-waste (people, animals,
/// vehicles, nature, food, furniture). Only consulted when no category
/// keyword matched anything; two or more hits short-circuit to `Unknown`.
pub const NON_EEE_KEYWORDS: &[&str] = &[
    "person", "pessoa", "people", "boy", "girl", "dog", "cachorro", "cat",
    "gato", "bird", "animal", "horse", "cavalo", "tree", "árvore", "plant",
    "planta", "flower", "flor", "grass", "grama", "landscape", "paisagem",
    "sky", "céu", "beach", "praia", "ocean", "mountain", "montanha", "car",
    "carro", "bicycle", "bike", "motorcycle", "truck", "caminhão", "bus",
    "food", "comida", "fruit", "fruta", "vegetable", "drink", "bebida",
    "house", "casa", "building", "street", "wall", "sofa", "couch", "table",
    "mesa", "chair", "cadeira", "book", "livro",
];
