use rdkafka::error::KafkaError;

/// Whether a consume-loop error is worth retrying with backoff rather than
/// treated as fatal. Mirrors the original's string-matched transient-error
/// list, expressed over `rdkafka`'s typed error instead of substring
/// matching on a driver message.
pub fn is_transient_kafka_error(err: &KafkaError) -> bool {
    use rdkafka::types::RDKafkaErrorCode as Code;

    match err {
        KafkaError::MessageConsumption(code) => matches!(
            code,
            Code::BrokerTransportFailure | Code::NetworkException | Code::AllBrokersDown | Code::RequestTimedOut
        ),
        KafkaError::PartitionEOF(_) => false,
        _ => false,
    }
}
