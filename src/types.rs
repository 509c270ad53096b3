// Shared metric query types used by the service and metrics layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Sum => "Sum",
        }
    }
}
