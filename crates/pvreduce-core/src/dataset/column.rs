use chrono::NaiveDateTime;
use ndarray::Array1;

/// A single cell value, used when rows are rebuilt cell by cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Missing,
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Float(v) => v.is_nan(),
            Self::Text(_) | Self::DateTime(_) => false,
        }
    }

    /// Text rendering used for join keys and group keys.
    ///
    /// Integral floats render without a decimal part so that `7.0` read back
    /// from a spreadsheet matches a text id `"7"`. Missing renders as `nan`.
    pub fn key(&self) -> String {
        match self {
            Self::Missing => "nan".to_string(),
            Self::Float(v) if v.is_nan() => "nan".to_string(),
            Self::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.0}", v),
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// A typed column. Missing floats are NaN, missing text and datetimes are `None`.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Float(Array1<f64>),
    Text(Vec<Option<String>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl Column {
    pub fn missing(len: usize) -> Self {
        Self::Float(Array1::from_elem(len, f64::NAN))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::DateTime(_) => "datetime",
        }
    }

    pub fn value(&self, row: usize) -> Value {
        match self {
            Self::Float(v) if v[row].is_nan() => Value::Missing,
            Self::Float(v) => Value::Float(v[row]),
            Self::Text(v) => v[row].clone().map_or(Value::Missing, Value::Text),
            Self::DateTime(v) => v[row].map_or(Value::Missing, Value::DateTime),
        }
    }

    pub fn non_missing(&self) -> usize {
        match self {
            Self::Float(v) => v.iter().filter(|x| !x.is_nan()).count(),
            Self::Text(v) => v.iter().filter(|x| x.is_some()).count(),
            Self::DateTime(v) => v.iter().filter(|x| x.is_some()).count(),
        }
    }

    /// Gather rows by position into a new column.
    pub fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Float(v) => Self::Float(rows.iter().map(|&r| v[r]).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|&r| v[r].clone()).collect()),
            Self::DateTime(v) => Self::DateTime(rows.iter().map(|&r| v[r]).collect()),
        }
    }

    /// Build a column from cell values, picking the narrowest kind that holds
    /// every non-missing value. Mixed kinds fall back to text.
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut floats = true;
        let mut datetimes = true;
        for value in &values {
            match value {
                Value::Missing => {}
                Value::Float(_) => datetimes = false,
                Value::DateTime(_) => floats = false,
                Value::Text(_) => {
                    floats = false;
                    datetimes = false;
                }
            }
        }

        if floats {
            Self::Float(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Float(x) => x,
                        _ => f64::NAN,
                    })
                    .collect(),
            )
        } else if datetimes {
            Self::DateTime(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::DateTime(dt) => Some(dt),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            Self::Text(
                values
                    .into_iter()
                    .map(|v| if v.is_missing() { None } else { Some(v.key()) })
                    .collect(),
            )
        }
    }

    /// Append `other` below `self`, widening to text when the kinds differ.
    pub fn concat(&self, other: &Column) -> Self {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => {
                Self::Float(a.iter().chain(b.iter()).copied().collect())
            }
            (Self::Text(a), Self::Text(b)) => Self::Text(a.iter().chain(b.iter()).cloned().collect()),
            (Self::DateTime(a), Self::DateTime(b)) => {
                Self::DateTime(a.iter().chain(b.iter()).copied().collect())
            }
            _ => {
                let values = (0..self.len())
                    .map(|r| self.value(r))
                    .chain((0..other.len()).map(|r| other.value(r)))
                    .collect();
                Self::from_values(values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_float_key_has_no_decimals() {
        assert_eq!(Value::Float(7.0).key(), "7");
        assert_eq!(Value::Float(2.5).key(), "2.5");
        assert_eq!(Value::Missing.key(), "nan");
    }

    #[test]
    fn from_values_prefers_float() {
        let col = Column::from_values(vec![Value::Float(1.0), Value::Missing]);
        assert_eq!(col.kind(), "float");
        assert_eq!(col.non_missing(), 1);
    }

    #[test]
    fn mixed_concat_widens_to_text() {
        let a = Column::Float(ndarray::array![1.0, 2.0]);
        let b = Column::Text(vec![Some("F3".to_string())]);
        let merged = a.concat(&b);
        assert_eq!(
            merged,
            Column::Text(vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("F3".to_string())
            ])
        );
    }
}
