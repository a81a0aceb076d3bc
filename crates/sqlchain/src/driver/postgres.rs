use crate::config::ConnectionConfig;
use crate::connection::Session;
use crate::error::{SqlError, SqlResult};
use crate::params::{BoundParam, ParamKey};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres::fallible_iterator::FallibleIterator;
use postgres::types::{IsNull, ToSql, Type};
use postgres::{Client, NoTls};
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;

/// PostgreSQL session backed by a blocking `postgres::Client`.
///
/// Placeholders are `$1, $2, ...`. Named parameters are accepted only when the
/// name is a position (`$2` or `2`).
pub struct PgSession {
    client: Client,
}

impl PgSession {
    /// Connect using `config`. A `postgres://` URL in `database` is used as-is.
    pub fn connect(config: &ConnectionConfig) -> SqlResult<Self> {
        let pg = pg_config(config)?;
        let client = pg
            .connect(NoTls)
            .map_err(|e| SqlError::connection(format!("failed to connect to postgres: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn pg_config(config: &ConnectionConfig) -> SqlResult<postgres::Config> {
    let database = config.database.as_str();
    if database.starts_with("postgres://") || database.starts_with("postgresql://") {
        return postgres::Config::from_str(database)
            .map_err(|e| SqlError::connection(format!("invalid postgres url: {e}")));
    }

    let mut pg = postgres::Config::new();
    pg.host(&config.host).dbname(database);
    if let Some(port) = config.port {
        pg.port(port);
    }
    if !config.user.is_empty() {
        pg.user(&config.user);
    }
    if !config.password.is_empty() {
        pg.password(&config.password);
    }
    Ok(pg)
}

/// Order bound values by placeholder position. Every position up to the
/// highest one must be bound exactly once.
fn ordered_values(params: &[BoundParam]) -> SqlResult<Vec<&Value>> {
    let mut slots: Vec<Option<&Value>> = Vec::with_capacity(params.len());
    for param in params {
        let position = match &param.key {
            ParamKey::Position(p) => *p,
            ParamKey::Name(name) => name
                .trim_start_matches('$')
                .parse::<usize>()
                .map_err(|_| {
                    SqlError::execution(format!(
                        "postgres placeholders are positional, cannot bind {name}"
                    ))
                })?,
        };
        if position == 0 {
            return Err(SqlError::execution("placeholder positions start at 1"));
        }
        // n params can only fill $1..$n; anything higher leaves a gap
        if position > params.len() {
            return Err(SqlError::execution(format!(
                "${position} is out of range for {} parameters",
                params.len()
            )));
        }
        if slots.len() < position {
            slots.resize(position, None);
        }
        if slots[position - 1].replace(&param.value).is_some() {
            return Err(SqlError::execution(format!("${position} is bound twice")));
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.ok_or_else(|| SqlError::execution(format!("${} is not bound", i + 1))))
        .collect()
}

fn decode_column(row: &postgres::Row, index: usize) -> SqlResult<Value> {
    let column = &row.columns()[index];
    let decode_err = |e: postgres::Error| SqlError::decode(column.name(), e.to_string());

    macro_rules! get {
        ($ty:ty) => {
            row.try_get::<_, Option<$ty>>(index)
                .map_err(decode_err)?
                .map(Value::from)
        };
    }

    let value = match *column.type_() {
        Type::BOOL => get!(bool),
        Type::INT2 => get!(i16),
        Type::INT4 => get!(i32),
        Type::INT8 => get!(i64),
        Type::OID => get!(u32),
        Type::FLOAT4 => get!(f32),
        Type::FLOAT8 => get!(f64),
        // exact text, as the server prints it
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)
            .map_err(decode_err)?
            .map(|d| Value::Text(d.to_string())),
        Type::BYTEA => get!(Vec<u8>),
        Type::JSON | Type::JSONB => get!(serde_json::Value),
        Type::UUID => get!(uuid::Uuid),
        Type::DATE => get!(NaiveDate),
        Type::TIME => get!(NaiveTime),
        Type::TIMESTAMP => get!(NaiveDateTime),
        Type::TIMESTAMPTZ => get!(DateTime<Utc>),
        _ => get!(String),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn read_row(row: &postgres::Row) -> SqlResult<Row> {
    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
    let values = (0..row.len())
        .map(|i| decode_column(row, i))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(Row::new(columns, values))
}

impl Session for PgSession {
    fn query(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Vec<Row>> {
        let values = ordered_values(params)?;
        let refs: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect();
        let rows = self.client.query(sql, &refs)?;
        rows.iter().map(read_row).collect()
    }

    fn query_one(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Option<Row>> {
        let values = ordered_values(params)?;
        let refs: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect();
        let mut rows = self.client.query_raw(sql, refs.iter().copied())?;
        match rows.next()? {
            Some(row) => read_row(&row).map(Some),
            None => Ok(None),
        }
    }

    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<u64> {
        let values = ordered_values(params)?;
        let refs: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect();
        Ok(self.client.execute(sql, &refs)?)
    }

    fn begin(&mut self) -> SqlResult<()> {
        Ok(self.client.batch_execute("BEGIN")?)
    }

    fn commit(&mut self) -> SqlResult<()> {
        Ok(self.client.batch_execute("COMMIT")?)
    }

    fn rollback(&mut self) -> SqlResult<()> {
        Ok(self.client.batch_execute("ROLLBACK")?)
    }

    fn driver_name(&self) -> &'static str {
        "pgsql"
    }
}

// ─── ToSql ──────────────────────────────────────────────────────────────────

type BoxError = Box<dyn Error + Sync + Send>;

/// Values adapt to the parameter type the server inferred for the placeholder.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 => Value::Int(i64::from(*b)).to_sql(ty, out),
                _ => b.to_sql(ty, out),
            },
            Value::Int(i) => int_to_sql(*i, ty, out),
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*f)?.to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::Bytes(b) => match *ty {
                Type::BYTEA => b.to_sql(ty, out),
                _ => text_to_sql(std::str::from_utf8(b)?, ty, out),
            },
            Value::Json(j) => match *ty {
                Type::JSON | Type::JSONB => j.to_sql(ty, out),
                _ => j.to_string().to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    postgres::types::to_sql_checked!();
}

fn int_to_sql(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::NUMERIC => Decimal::from(i).to_sql(ty, out),
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::OID => u32::try_from(i)?.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::BOOL => (i != 0).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => i.to_string().to_sql(ty, out),
        _ => i.to_sql(ty, out),
    }
}

fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => int_to_sql(s.trim().parse()?, ty, out),
        Type::FLOAT4 | Type::FLOAT8 => Value::Float(s.trim().parse()?).to_sql(ty, out),
        Type::NUMERIC => Decimal::from_str(s.trim())?.to_sql(ty, out),
        Type::BOOL => match s.to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "yes" | "on" => true.to_sql(ty, out),
            "0" | "f" | "false" | "no" | "off" => false.to_sql(ty, out),
            other => Err(format!("invalid boolean literal '{other}'").into()),
        },
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(s)?.to_sql(ty, out),
        Type::DATE => s.parse::<NaiveDate>()?.to_sql(ty, out),
        Type::TIME => s.parse::<NaiveTime>()?.to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(s)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(s)?
            .with_timezone(&Utc)
            .to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        _ => s.to_sql(ty, out),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    s.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
}
