use parking_lot::Mutex;

use crate::error::Result;
use crate::metric::ledger::{Ledger, LedgerPolicy, Merge};
use crate::metric::tally::{EndpointTable, Tally};
use crate::metric::{ExportMap, Metric, MetricNames};
use crate::request::RequestRecord;

/// Generic metric over a per-endpoint tally.
///
/// Live accumulator and ledger share one lock, one per metric. `update` only
/// holds it for the merge of a precomputed delta.
pub struct TallyMetric<T: Tally> {
    name: &'static str,
    names: MetricNames,
    state: Mutex<State<T>>,
}

struct State<T: Tally> {
    live: EndpointTable<T>,
    ledger: Ledger<EndpointTable<T>>,
}

impl<T: Tally> TallyMetric<T> {
    pub fn with_names(name: &'static str, names: MetricNames, policy: LedgerPolicy) -> Self {
        Self {
            name,
            names,
            state: Mutex::new(State {
                live: EndpointTable::seeded(),
                ledger: Ledger::new(policy),
            }),
        }
    }

    pub fn names(&self) -> &MetricNames {
        &self.names
    }

    /// Totals over the ledger plus live state, without rotating anything.
    pub fn peek(&self) -> EndpointTable<T> {
        let st = self.state.lock();
        let mut totals = st.ledger.total();
        totals.merge(&st.live);
        totals
    }

    fn render(&self, totals: &EndpointTable<T>) -> ExportMap {
        let mut out = ExportMap::new();
        for (endpoint, t) in totals.iter() {
            out.insert(self.names.endpoint_key(endpoint), t.value());
        }
        out.insert(self.names.overall_key(), totals.overall().value());
        out
    }
}

impl<T: Tally> Metric for TallyMetric<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn update(&self, record: &RequestRecord) -> Result<()> {
        let delta = T::sample(record)?;
        self.state.lock().live.add(record.endpoint(), &delta);
        Ok(())
    }

    fn export(&self) -> ExportMap {
        let totals = {
            let mut st = self.state.lock();
            let snapshot = st.live.rotate();
            st.ledger.push(snapshot);
            st.ledger.total()
        };
        self.render(&totals)
    }

    fn clear(&self) {
        self.state.lock().ledger.clear();
    }

    fn pending_snapshots(&self) -> usize {
        self.state.lock().ledger.len()
    }
}
