use framekit_core::Bus;
use ratemybags::codec;
use ratemybags::payload::ActionPayload;
use ratemybags::{
    DescriptorBuilder, EmojiReactions, FrameDescriptor, FrameDriver, FrameResources, SessionState,
    Step,
};

const HOST: &str = "https://bags.example.com";
const DEMO: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

fn driver() -> FrameDriver {
    FrameDriver::new(FrameResources {
        builder: DescriptorBuilder::new(HOST),
        demo_wallet: DEMO.to_string(),
    })
}

async fn press(driver: &FrameDriver, state: &SessionState, action: u32) -> FrameDescriptor {
    let token = codec::encode(state).expect("encodes");
    driver
        .handle(ActionPayload::with_action(action, Some(token)), &mut Bus::new())
        .await
        .expect("frame request succeeds")
}

fn state_of(descriptor: &FrameDescriptor) -> SessionState {
    codec::decode(&descriptor.state).expect("descriptor carries a valid token")
}

fn labels(descriptor: &FrameDescriptor) -> Vec<&str> {
    descriptor.buttons.iter().map(|b| b.label.as_str()).collect()
}

#[tokio::test]
async fn initial_connect_moves_to_wallet_step() {
    let descriptor = press(&driver(), &SessionState::initial(), 1).await;
    assert_eq!(state_of(&descriptor), SessionState::at(Step::ConnectWallet));
    assert_eq!(labels(&descriptor), ["Connect Ethereum Wallet"]);
    assert_eq!(descriptor.post_url, format!("{HOST}/api/frame"));
}

#[tokio::test]
async fn wallet_connect_records_the_demo_address() {
    let descriptor = press(&driver(), &SessionState::at(Step::ConnectWallet), 1).await;
    let state = state_of(&descriptor);
    assert_eq!(state.step, Step::PortfolioDisplay);
    assert_eq!(state.wallet_address.as_deref(), Some(DEMO));
    assert!(descriptor.image_url.contains(&format!("address={DEMO}")));
}

#[tokio::test]
async fn wallet_connect_uses_a_valid_caller_address() {
    let caller = "0x1111111111111111111111111111111111111111";
    let token = codec::encode(&SessionState::at(Step::ConnectWallet)).expect("encodes");
    let body = format!(
        r#"{{"buttonIndex":1,"state":"{token}","untrustedData":{{"fid":3,"address":"{caller}"}}}}"#
    );
    let descriptor = driver()
        .handle(ActionPayload::from_body(body.as_bytes()), &mut Bus::new())
        .await
        .expect("frame request succeeds");
    assert_eq!(state_of(&descriptor).wallet_address.as_deref(), Some(caller));
}

#[tokio::test]
async fn rating_appends_and_moves_to_reactions() {
    let mut state = SessionState::at(Step::CommunityRating);
    state.ratings = Some(vec![]);
    let descriptor = press(&driver(), &state, 5).await;
    let next = state_of(&descriptor);
    assert_eq!(next.step, Step::EmojiReactions);
    assert_eq!(next.ratings, Some(vec![5]));
    assert_eq!(labels(&descriptor), ["🔥", "💎", "🚀", "👍"]);
}

#[tokio::test]
async fn out_of_range_action_redisplays_the_step() {
    let mut state = SessionState::at(Step::EmojiReactions);
    state.ratings = Some(vec![8]);
    let descriptor = press(&driver(), &state, 99).await;
    assert_eq!(state_of(&descriptor), state);
    assert_eq!(descriptor.image_url, format!("{HOST}/images/emoji-reactions.png"));
}

#[tokio::test]
async fn missing_action_redisplays_the_step() {
    let state = SessionState::at(Step::NftMinting);
    let token = codec::encode(&state).expect("encodes");
    let payload = ActionPayload::from_body(format!(r#"{{"state":"{token}"}}"#).as_bytes());
    let descriptor = driver().handle(payload, &mut Bus::new()).await.expect("succeeds");
    assert_eq!(state_of(&descriptor), state);
    assert_eq!(labels(&descriptor), ["Confirm Mint & Share"]);
}

#[tokio::test]
async fn garbage_token_starts_over_and_applies_the_action() {
    let payload = ActionPayload::with_action(1, Some("%%not-a-token%%".to_string()));
    let descriptor = driver().handle(payload, &mut Bus::new()).await.expect("succeeds");
    assert_eq!(state_of(&descriptor).step, Step::ConnectWallet);
}

#[tokio::test]
async fn unknown_step_resets_without_applying_the_action() {
    let payload = ActionPayload::with_action(1, Some(r#"{"step":"checkout"}"#.to_string()));
    let descriptor = driver().handle(payload, &mut Bus::new()).await.expect("succeeds");
    assert_eq!(state_of(&descriptor), SessionState::initial());
    assert_eq!(descriptor.image_url, format!("{HOST}/api/og"));
    assert_eq!(labels(&descriptor), ["Connect Wallet"]);
}

#[tokio::test]
async fn full_session_walkthrough() {
    let driver = driver();
    let mut state = SessionState::initial();

    for (action, expected) in [
        (1, Step::ConnectWallet),
        (1, Step::PortfolioDisplay),
        (2, Step::PortfolioDisplay),
        (3, Step::CommunityRating),
        (9, Step::EmojiReactions),
        (3, Step::ResultsDisplay),
        (1, Step::NftMinting),
        (1, Step::ShareResults),
    ] {
        state = state_of(&press(&driver, &state, action).await);
        assert_eq!(state.step, expected, "after action {action}");
    }

    assert_eq!(state.wallet_address.as_deref(), Some(DEMO));
    assert_eq!(state.show_usd_values, Some(true));
    assert_eq!(state.ratings, Some(vec![9]));
    assert_eq!(
        state.emoji_reactions,
        Some(EmojiReactions {
            rocket: 1,
            ..Default::default()
        })
    );

    let share = press(&driver, &state, 2).await;
    assert_eq!(state_of(&share), state, "share only offers restart");
    assert!(share.image_url.starts_with(&format!("{HOST}/api/share?state=")));

    let restarted = press(&driver, &state, 1).await;
    assert_eq!(state_of(&restarted), SessionState::initial());
}

#[tokio::test]
async fn results_can_skip_minting() {
    let mut state = SessionState::at(Step::ResultsDisplay);
    state.ratings = Some(vec![4]);
    let descriptor = press(&driver(), &state, 2).await;
    assert_eq!(state_of(&descriptor).step, Step::ShareResults);
    assert_eq!(state_of(&descriptor).ratings, Some(vec![4]));
}
