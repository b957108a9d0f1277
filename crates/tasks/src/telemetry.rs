use shared::protocol::{TaskSample, TelemetryRecord};

#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    capacity: usize,
    samples: Vec<TaskSample>,
}

impl TelemetryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: TaskSample) -> Option<TelemetryRecord> {
        self.samples.push(sample);
        if self.samples.len() >= self.capacity {
            self.drain()
        } else {
            None
        }
    }

    pub fn drain(&mut self) -> Option<TelemetryRecord> {
        if self.samples.is_empty() {
            return None;
        }
        let batch = std::mem::replace(&mut self.samples, Vec::with_capacity(self.capacity));
        Some(TelemetryRecord::Samples(batch))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::Pose;
    use uuid::Uuid;

    use super::*;

    fn sample(timestamp_ms: u64) -> TaskSample {
        TaskSample {
            task_id: Uuid::nil(),
            task: "erasing".to_string(),
            condition: "remote-only".to_string(),
            round: 0,
            timestamp_ms,
            controller: None,
            end_effector: None,
            goal: Pose::identity(),
            detail: serde_json::Value::Null,
        }
    }

    #[test]
    fn flushes_when_full() {
        let mut buffer = TelemetryBuffer::new(3);
        assert!(buffer.push(sample(1)).is_none());
        assert!(buffer.push(sample(2)).is_none());
        let Some(TelemetryRecord::Samples(batch)) = buffer.push(sample(3)) else {
            panic!("expected a batch");
        };
        assert_eq!(batch.len(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_of_empty_buffer_sends_nothing() {
        let mut buffer = TelemetryBuffer::new(500);
        assert!(buffer.drain().is_none());
        buffer.push(sample(1));
        assert!(matches!(buffer.drain(), Some(TelemetryRecord::Samples(batch)) if batch.len() == 1));
    }
}
