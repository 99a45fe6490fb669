use modelstack_deploy::{EventBus, ManagementConfig, ModelEvent};
use modelstack_types::{Language, ModelVersion};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn subscribers_receive_events_in_order() {
    let bus = EventBus::default();
    let mut first = bus.subscribe();
    let mut second = bus.subscribe();

    let language = Language::parse("bg").unwrap();
    assert_eq!(bus.publish(ModelEvent::LanguageChanged(language.clone())), 2);
    bus.publish(ModelEvent::ModelsSaved {
        version: ModelVersion::new(2),
    });

    assert_eq!(first.recv().await.unwrap(), ModelEvent::LanguageChanged(language.clone()));
    assert_eq!(
        first.recv().await.unwrap(),
        ModelEvent::ModelsSaved {
            version: ModelVersion::new(2)
        }
    );
    assert_eq!(second.recv().await.unwrap(), ModelEvent::LanguageChanged(language));
}

#[test]
fn dropping_receiver_unsubscribes() {
    let bus = EventBus::new(4);
    let receiver = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);

    drop(receiver);

    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(bus.publish(ModelEvent::ModelsReloaded), 0);
}

#[test]
fn late_subscribers_miss_earlier_events() {
    let bus = EventBus::default();
    let _keep = bus.subscribe();
    bus.publish(ModelEvent::ConfigurationUpdated(ManagementConfig::default()));

    let mut late = bus.subscribe();
    assert!(late.try_recv().is_err());
}
