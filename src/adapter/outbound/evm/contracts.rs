//! Solidity interfaces of the contracts this tool drives.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    contract IAlgebraFactory {
        function poolByPair(address tokenA, address tokenB) external view returns (address pool);
    }
}

sol! {
    #[sol(rpc)]
    contract IAlgebraPool {
        function globalState() external view returns (
            uint160 price,
            int24 tick,
            uint16 fee,
            uint16 timepointIndex,
            uint8 communityFeeToken0,
            uint8 communityFeeToken1,
            bool unlocked
        );
        function tickSpacing() external view returns (int24);
    }
}

sol! {
    #[sol(rpc)]
    contract INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        struct DecreaseLiquidityParams {
            uint256 tokenId;
            uint128 liquidity;
            uint256 amount0Min;
            uint256 amount1Min;
            uint256 deadline;
        }

        struct CollectParams {
            uint256 tokenId;
            address recipient;
            uint128 amount0Max;
            uint128 amount1Max;
        }

        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function createAndInitializePoolIfNecessary(address token0, address token1, uint160 sqrtPriceX96)
            external payable returns (address pool);
        function mint(MintParams calldata params)
            external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        function decreaseLiquidity(DecreaseLiquidityParams calldata params)
            external payable returns (uint256 amount0, uint256 amount1);
        function collect(CollectParams calldata params)
            external payable returns (uint256 amount0, uint256 amount1);
        function burn(uint256 tokenId) external payable;
        function positions(uint256 tokenId) external view returns (
            uint96 nonce,
            address operator,
            address token0,
            address token1,
            int24 tickLower,
            int24 tickUpper,
            uint128 liquidity,
            uint256 feeGrowthInside0LastX128,
            uint256 feeGrowthInside1LastX128,
            uint128 tokensOwed0,
            uint128 tokensOwed1
        );
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    contract IFutarchyRouter {
        function splitPosition(address proposal, address collateralToken, uint256 amount) external;
        function mergePositions(address proposal, address collateralToken, uint256 amount) external;
    }
}

sol! {
    #[sol(rpc)]
    contract IFutarchyProposal {
        function collateralToken1() external view returns (address);
        function collateralToken2() external view returns (address);
        function wrappedOutcome(uint256 index) external view returns (address wrapped1155, bytes data);
    }
}
