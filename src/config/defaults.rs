/// Units applied the first time the catalog loads and nothing has been chosen yet.
pub struct DefaultUnits {
    pub main_unit: &'static str,
    /// (position, unit) pairs. Positions without an entry stay empty.
    pub slot_units: &'static [(u32, &'static str)],
}

impl DefaultUnits {
    pub fn slot_unit(&self, position: u32) -> Option<&'static str> {
        self.slot_units
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, code)| *code)
    }
}

pub const DEFAULTS: DefaultUnits = DefaultUnits {
    main_unit: "gbp", // British Pound
    slot_units: &[
        (1, "usd"), // US Dollar
        (2, "eur"), // Euro
        (3, "jpy"), // Japanese Yen
        (4, "chf"), // Swiss Franc
        (5, "cad"), // Canadian Dollar
        (6, "aud"), // Australian Dollar
        (7, "zar"), // South African Rand
    ],
};
